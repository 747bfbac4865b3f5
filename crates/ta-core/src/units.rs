//! Unit conversions used at the reporting boundary.
//!
//! Every time inside the assignment core is in **seconds** and every flow is
//! in **vehicles per hour**.  A sum of `flow × time` is therefore in
//! vehicle-seconds per hour.  Reports present vehicle-hours per hour and
//! minutes per vehicle; the conversions live here and nowhere else.

pub const SECS_PER_HOUR: f64 = 3_600.0;
pub const MINS_PER_HOUR: f64 = 60.0;

/// Vehicle-seconds (per hour) → vehicle-hours (per hour).
#[inline]
pub fn veh_secs_to_veh_hours(veh_secs: f64) -> f64 {
    veh_secs / SECS_PER_HOUR
}

/// Average minutes per vehicle from a system total in vehicle-hours per hour
/// and the total demand in vehicles per hour.  Zero when there is no demand.
#[inline]
pub fn avg_minutes_per_vehicle(veh_hours: f64, total_demand_vph: f64) -> f64 {
    if total_demand_vph <= 0.0 {
        return 0.0;
    }
    veh_hours / total_demand_vph * MINS_PER_HOUR
}

/// Kilometres per hour → metres per second.
#[inline]
pub fn kph_to_mps(kph: f64) -> f64 {
    kph * 1_000.0 / SECS_PER_HOUR
}
