//! Edge-attribute initialization.
//!
//! Map data is sparse and loosely typed: `maxspeed` may be `"50"`,
//! `"30 mph"` or a list such as `"['40', '50']"`; `lanes` may read `"2;3"`
//! or `"2|3"`; `highway` may be missing.  This module resolves those raw
//! values into the fixed [`EdgeAttrs`] schema once, at ingestion.  The
//! assignment core never sees unnormalized values and never re-derives
//! `free_flow_s` or `capacity_vph`.
//!
//! Missing or unparsable values are never errors: each falls back to a
//! documented default from [`NetworkDefaults`].

use ta_core::units::kph_to_mps;
use ta_core::NetworkDefaults;

/// Smallest free-flow time assigned to any edge, seconds.  Keeps `t0 > 0`
/// for zero-length segments.
pub const MIN_FREE_FLOW_S: f64 = 0.1;

// ── Highway class ─────────────────────────────────────────────────────────────

/// Functional road class, used for the per-lane capacity lookup and for
/// demand weighting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HighwayClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Service,
    /// A connector added by a scenario.
    ProposedConnector,
    /// Any class outside the lookup table.
    Other,
}

impl HighwayClass {
    /// Parse a raw `highway` tag.  Lists take their first element; a
    /// missing tag is treated as `residential`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(tag) = raw.and_then(first_list_item) else {
            return HighwayClass::Residential;
        };
        match tag.as_str() {
            "motorway"           => HighwayClass::Motorway,
            "trunk"              => HighwayClass::Trunk,
            "primary"            => HighwayClass::Primary,
            "secondary"          => HighwayClass::Secondary,
            "tertiary"           => HighwayClass::Tertiary,
            "residential"        => HighwayClass::Residential,
            "service"            => HighwayClass::Service,
            "proposed_connector" => HighwayClass::ProposedConnector,
            _                    => HighwayClass::Other,
        }
    }

    /// Practical capacity per lane, vehicles/hour.  `None` for classes
    /// outside the table; callers substitute the configured default.
    pub fn capacity_per_lane(self) -> Option<f64> {
        match self {
            HighwayClass::Motorway    => Some(1_800.0),
            HighwayClass::Trunk       => Some(1_700.0),
            HighwayClass::Primary     => Some(1_400.0),
            HighwayClass::Secondary   => Some(1_100.0),
            HighwayClass::Tertiary    => Some(900.0),
            HighwayClass::Residential => Some(600.0),
            HighwayClass::Service     => Some(400.0),
            HighwayClass::ProposedConnector | HighwayClass::Other => None,
        }
    }

    /// Relative attractiveness of a node touching a road of this class as
    /// a trip end.  Higher classes draw more trips.
    pub fn importance(self) -> f64 {
        match self {
            HighwayClass::Motorway    => 5.0,
            HighwayClass::Trunk       => 4.0,
            HighwayClass::Primary     => 3.0,
            HighwayClass::Secondary   => 2.0,
            HighwayClass::Tertiary    => 1.5,
            HighwayClass::Residential => 1.0,
            HighwayClass::Service     => 0.6,
            HighwayClass::ProposedConnector | HighwayClass::Other => 1.0,
        }
    }

    /// Label used in output tables.
    pub fn as_str(self) -> &'static str {
        match self {
            HighwayClass::Motorway          => "motorway",
            HighwayClass::Trunk             => "trunk",
            HighwayClass::Primary           => "primary",
            HighwayClass::Secondary         => "secondary",
            HighwayClass::Tertiary          => "tertiary",
            HighwayClass::Residential       => "residential",
            HighwayClass::Service           => "service",
            HighwayClass::ProposedConnector => "proposed_connector",
            HighwayClass::Other             => "other",
        }
    }
}

impl std::fmt::Display for HighwayClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Schemas ───────────────────────────────────────────────────────────────────

/// Raw, possibly incomplete edge attributes as delivered by ingestion.
#[derive(Clone, Debug, Default)]
pub struct RawEdgeAttrs {
    pub length_m:      Option<f64>,
    pub maxspeed:      Option<String>,
    pub lanes:         Option<String>,
    pub highway:       Option<String>,
    /// Precomputed free-flow travel time, preferred over speed when present.
    pub travel_time_s: Option<f64>,
}

/// Normalized, fixed edge attributes.  Immutable once the network is built.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeAttrs {
    pub length_m:     f64,
    /// Free-flow travel time `t0`, seconds.  Always > 0.
    pub free_flow_s:  f64,
    /// Practical throughput, vehicles/hour.  Always > 0.
    pub capacity_vph: f64,
    pub lanes:        f64,
    pub highway:      HighwayClass,
}

impl EdgeAttrs {
    /// Attributes for a road of known length, speed and capacity.  Used by
    /// hand-built networks and by scenario connectors.
    pub fn from_speed(length_m: f64, speed_kph: f64, lanes: f64, capacity_vph: f64, highway: HighwayClass) -> Self {
        Self {
            length_m,
            free_flow_s: free_flow_time_s(length_m, speed_kph),
            capacity_vph,
            lanes,
            highway,
        }
    }
}

// ── Initialization ────────────────────────────────────────────────────────────

/// Travel time over `length_m` at `speed_kph`, floored at
/// [`MIN_FREE_FLOW_S`].  Speeds below 1 m/s count as 1 m/s.
pub fn free_flow_time_s(length_m: f64, speed_kph: f64) -> f64 {
    let speed_mps = kph_to_mps(speed_kph).max(1.0);
    (length_m.max(0.0) / speed_mps).max(MIN_FREE_FLOW_S)
}

/// Resolve raw attributes into the fixed schema.
///
/// - length: raw value if finite and ≥ 0, else `default_length_m`.
/// - `free_flow_s`: raw `travel_time_s` if finite and > 0, else
///   `length / speed` with speed = parsed `maxspeed` (or the default),
///   floored at `min_speed_kph`.
/// - lanes: first parsed value, at least 1.
/// - capacity: per-lane capacity of the highway class (or the default) ×
///   lanes, floored at `min_capacity_vph`.
pub fn init_edge_attributes(raw: &RawEdgeAttrs, defaults: &NetworkDefaults) -> EdgeAttrs {
    let length_m = raw
        .length_m
        .filter(|l| l.is_finite() && *l >= 0.0)
        .unwrap_or(defaults.default_length_m);

    let free_flow_s = match raw.travel_time_s.filter(|t| t.is_finite() && *t > 0.0) {
        Some(t) => t,
        None => {
            let speed_kph = raw
                .maxspeed
                .as_deref()
                .and_then(parse_speed_kph)
                .unwrap_or(defaults.default_speed_kph)
                .max(defaults.min_speed_kph);
            free_flow_time_s(length_m, speed_kph)
        }
    };

    let lanes = raw
        .lanes
        .as_deref()
        .and_then(parse_lanes)
        .unwrap_or(1.0)
        .max(1.0);

    let highway = HighwayClass::parse(raw.highway.as_deref());
    let per_lane = highway
        .capacity_per_lane()
        .unwrap_or(defaults.default_capacity_per_lane);
    let capacity_vph = (per_lane * lanes).max(defaults.min_capacity_vph);

    EdgeAttrs { length_m, free_flow_s, capacity_vph, lanes, highway }
}

// ── Raw value parsing ─────────────────────────────────────────────────────────

/// Parse a `maxspeed` value: first list element, digits and `.` only.
/// `"30 mph"` reads as 30 (units are not converted).
pub fn parse_speed_kph(raw: &str) -> Option<f64> {
    let item = first_list_item(raw)?;
    let digits: String = item.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Parse a `lanes` value: first list element, first of `;`/`|` separated
/// alternatives.
pub fn parse_lanes(raw: &str) -> Option<f64> {
    let item = first_list_item(raw)?;
    let first = item.replace('|', ";");
    first
        .split(';')
        .next()
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Extract the first element of a list-encoded value (`"['a', 'b']"`,
/// `"[\"a\"]"`) or return the trimmed scalar.  Empty, `nan` and `None`
/// read as missing.
fn first_list_item(raw: &str) -> Option<String> {
    let s = raw.trim();
    let s = match s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        Some(inner) => inner.split(',').next().unwrap_or(""),
        None => s,
    };
    let s = s.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    match s {
        "" | "nan" | "NaN" | "None" | "null" => None,
        other => Some(other.to_owned()),
    }
}
