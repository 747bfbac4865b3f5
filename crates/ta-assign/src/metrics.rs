//! System performance metrics over a solved network.
//!
//! Raw sums are in vehicle-seconds per hour (flow in vph × time in s).  The
//! KPI struct converts them once, via [`ta_core::units`].

use std::cmp::Ordering;

use ta_core::units::{avg_minutes_per_vehicle, veh_secs_to_veh_hours};
use ta_core::EdgeKey;
use ta_network::RoadNetwork;

/// Total System Travel Time, `Σ flow × time`, vehicle-seconds/hour.
pub fn total_system_travel_time_s(net: &RoadNetwork) -> f64 {
    net.edge_flow_vph
        .iter()
        .zip(&net.edge_time_s)
        .map(|(f, t)| f * t)
        .sum()
}

/// Total delay, `Σ flow × (time − t0)`, vehicle-seconds/hour.  Never negative.
pub fn total_delay_s(net: &RoadNetwork) -> f64 {
    (0..net.edge_count()).map(|i| edge_delay_s(net, i)).sum()
}

#[inline]
fn edge_delay_s(net: &RoadNetwork, i: usize) -> f64 {
    let extra = (net.edge_time_s[i] - net.edge_free_flow_s[i]).max(0.0);
    net.edge_flow_vph[i] * extra
}

// ── KPIs ──────────────────────────────────────────────────────────────────────

/// Headline indicators in reporting units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SystemKpis {
    /// Vehicle-hours per hour.
    pub tstt_veh_h: f64,
    /// Vehicle-hours per hour.
    pub delay_veh_h: f64,
    pub total_demand_vph: f64,
    /// Minutes per vehicle; 0 when there is no demand.
    pub avg_travel_min: f64,
    /// Minutes per vehicle; 0 when there is no demand.
    pub avg_delay_min: f64,
}

impl SystemKpis {
    pub fn from_network(net: &RoadNetwork, total_demand_vph: f64) -> Self {
        let tstt_veh_h = veh_secs_to_veh_hours(total_system_travel_time_s(net));
        let delay_veh_h = veh_secs_to_veh_hours(total_delay_s(net));
        Self {
            tstt_veh_h,
            delay_veh_h,
            total_demand_vph,
            avg_travel_min: avg_minutes_per_vehicle(tstt_veh_h, total_demand_vph),
            avg_delay_min: avg_minutes_per_vehicle(delay_veh_h, total_demand_vph),
        }
    }
}

// ── Bottlenecks ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bottleneck {
    pub edge: EdgeKey,
    pub flow_vph: f64,
    pub capacity_vph: f64,
    /// Volume-to-capacity ratio.
    pub v_c: f64,
    /// Edge delay, vehicle-seconds/hour.
    pub delay_s: f64,
    /// Edge delay, vehicle-hours/hour.
    pub delay_h: f64,
}

/// The `n` edges with the highest delay.  Ties are broken by v/c
/// descending, then by edge identifier ascending.
pub fn top_bottlenecks(net: &RoadNetwork, n: usize) -> Vec<Bottleneck> {
    let mut all: Vec<Bottleneck> = (0..net.edge_count())
        .map(|i| {
            let flow = net.edge_flow_vph[i];
            let cap = net.edge_capacity_vph[i];
            let delay_s = edge_delay_s(net, i);
            Bottleneck {
                edge: net.edge_key[i],
                flow_vph: flow,
                capacity_vph: cap,
                v_c: flow / cap,
                delay_s,
                delay_h: veh_secs_to_veh_hours(delay_s),
            }
        })
        .collect();

    all.sort_by(bottleneck_order);
    all.truncate(n);
    all
}

/// Orders bottlenecks the same way as [`top_bottlenecks`].
pub fn bottleneck_order(a: &Bottleneck, b: &Bottleneck) -> Ordering {
    b.delay_s
        .total_cmp(&a.delay_s)
        .then_with(|| b.v_c.total_cmp(&a.v_c))
        .then_with(|| a.edge.cmp(&b.edge))
}
