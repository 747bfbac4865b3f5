//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Connector candidates are
//! filtered on straight-line distances of a few hundred metres, where
//! single-precision rounding (~1 m) would be visible in scores.

use serde::{Deserialize, Serialize};

/// Mean Earth radius, metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        // asin form; clamp guards against a > 1 from rounding on antipodes.
        let c = 2.0 * a.sqrt().min(1.0).asin();
        EARTH_RADIUS_M * c
    }

    /// Half-width in degrees of a box that is guaranteed to contain every
    /// point within `radius_m` of `self`.
    ///
    /// Longitude degrees shrink with `cos(lat)`; the cosine is floored so the
    /// box stays finite near the poles.
    pub fn bbox_half_deg(self, radius_m: f64) -> f64 {
        let lat_deg = (radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = self.lat.to_radians().cos().abs().max(0.01);
        lat_deg / cos_lat
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
