//! BPR volume-delay function.
//!
//! ```text
//! t = t0 · (1 + alpha · (flow / capacity)^beta)
//! ```
//!
//! The function is total over its inputs: it never panics and never returns
//! NaN for a finite `t0`.

use ta_core::BprParams;
use ta_network::RoadNetwork;

/// Capacity used in place of a non-positive or non-finite capacity.
pub const CAPACITY_FLOOR_VPH: f64 = 1.0;

/// Congested travel time, same unit as `t0`.
///
/// - Zero flow returns `t0` exactly.
/// - Negative or NaN flow counts as zero.
/// - Capacity `<= 0` (or non-finite) is floored at [`CAPACITY_FLOOR_VPH`].
/// - An overflowing result saturates at `f64::MAX`.
#[inline]
pub fn bpr_time(t0: f64, flow: f64, capacity: f64, params: &BprParams) -> f64 {
    if flow.is_nan() || flow <= 0.0 {
        return t0;
    }
    let cap = if capacity.is_finite() && capacity > 0.0 { capacity } else { CAPACITY_FLOOR_VPH };
    let t = t0 * (1.0 + params.alpha * (flow / cap).powf(params.beta));
    if t.is_nan() { t0 } else { t.min(f64::MAX) }
}

/// Recompute every edge's congested time from its current flow.
pub fn update_times(net: &mut RoadNetwork, params: &BprParams) {
    for i in 0..net.edge_count() {
        net.edge_time_s[i] = bpr_time(
            net.edge_free_flow_s[i],
            net.edge_flow_vph[i],
            net.edge_capacity_vph[i],
            params,
        );
    }
}
