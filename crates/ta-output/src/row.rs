//! Plain data row types written by output backends.
//!
//! Every row is flat (scalars only) so it serializes to exactly one CSV
//! record.  Network totals are vehicle-hours per hour; averages are minutes
//! per vehicle.

use serde::Serialize;

use ta_assign::{Bottleneck, SystemKpis};
use ta_demand::OdPair;
use ta_scenario::{BypassResult, ReductionPoint, ScenarioComparison};

/// A row type that owns one output table.
pub trait Table: Serialize {
    /// File stem of the table, e.g. `bottlenecks`.
    const NAME: &'static str;
    /// Column names, in serialization order.
    const HEADERS: &'static [&'static str];
}

// ── OD ────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OdRow {
    pub origin:      u64,
    pub destination: u64,
    pub demand_vph:  f64,
}

impl Table for OdRow {
    const NAME: &'static str = "od";
    const HEADERS: &'static [&'static str] = &["origin", "destination", "demand_vph"];
}

impl From<&OdPair> for OdRow {
    fn from(p: &OdPair) -> Self {
        Self { origin: p.origin.0, destination: p.destination.0, demand_vph: p.demand_vph }
    }
}

// ── Bottlenecks ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BottleneckRow {
    /// 1-based position in the ranking.
    pub rank:         usize,
    pub from:         u64,
    pub to:           u64,
    pub key:          u32,
    pub flow_vph:     f64,
    pub capacity_vph: f64,
    pub v_c:          f64,
    pub delay_veh_h:  f64,
}

impl Table for BottleneckRow {
    const NAME: &'static str = "bottlenecks";
    const HEADERS: &'static [&'static str] =
        &["rank", "from", "to", "key", "flow_vph", "capacity_vph", "v_c", "delay_veh_h"];
}

impl BottleneckRow {
    /// Rows for an already ranked list.
    pub fn ranked(bottlenecks: &[Bottleneck]) -> Vec<Self> {
        bottlenecks
            .iter()
            .enumerate()
            .map(|(i, b)| Self {
                rank:         i + 1,
                from:         b.edge.from.0,
                to:           b.edge.to.0,
                key:          b.edge.key,
                flow_vph:     b.flow_vph,
                capacity_vph: b.capacity_vph,
                v_c:          b.v_c,
                delay_veh_h:  b.delay_h,
            })
            .collect()
    }
}

// ── KPIs ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRow {
    /// `baseline` or a scenario id.
    pub run:              String,
    pub tstt_veh_h:       f64,
    pub delay_veh_h:      f64,
    pub total_demand_vph: f64,
    pub avg_travel_min:   f64,
    pub avg_delay_min:    f64,
}

impl Table for KpiRow {
    const NAME: &'static str = "kpis";
    const HEADERS: &'static [&'static str] = &[
        "run",
        "tstt_veh_h",
        "delay_veh_h",
        "total_demand_vph",
        "avg_travel_min",
        "avg_delay_min",
    ];
}

impl KpiRow {
    pub fn new(run: impl Into<String>, k: &SystemKpis) -> Self {
        Self {
            run:              run.into(),
            tstt_veh_h:       k.tstt_veh_h,
            delay_veh_h:      k.delay_veh_h,
            total_demand_vph: k.total_demand_vph,
            avg_travel_min:   k.avg_travel_min,
            avg_delay_min:    k.avg_delay_min,
        }
    }
}

// ── Scenario comparisons ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRow {
    pub scenario_id:            String,
    pub name:                   String,
    pub kind:                   String,
    pub description:            String,
    pub baseline_tstt_veh_h:    f64,
    pub scenario_tstt_veh_h:    f64,
    pub delta_tstt_veh_h:       f64,
    pub baseline_delay_veh_h:   f64,
    pub scenario_delay_veh_h:   f64,
    pub delta_delay_veh_h:      f64,
    pub delay_improvement_pct:  f64,
    pub baseline_avg_delay_min: f64,
    pub scenario_avg_delay_min: f64,
    pub unreachable_od:         usize,
    pub missing_endpoint_od:    usize,
}

impl Table for ScenarioRow {
    const NAME: &'static str = "scenarios";
    const HEADERS: &'static [&'static str] = &[
        "scenario_id",
        "name",
        "kind",
        "description",
        "baseline_tstt_veh_h",
        "scenario_tstt_veh_h",
        "delta_tstt_veh_h",
        "baseline_delay_veh_h",
        "scenario_delay_veh_h",
        "delta_delay_veh_h",
        "delay_improvement_pct",
        "baseline_avg_delay_min",
        "scenario_avg_delay_min",
        "unreachable_od",
        "missing_endpoint_od",
    ];
}

impl From<&ScenarioComparison> for ScenarioRow {
    fn from(c: &ScenarioComparison) -> Self {
        Self {
            scenario_id:            c.scenario_id.clone(),
            name:                   c.name.clone(),
            kind:                   c.kind.to_owned(),
            description:            c.description.clone(),
            baseline_tstt_veh_h:    c.baseline_tstt_veh_h,
            scenario_tstt_veh_h:    c.scenario_tstt_veh_h,
            delta_tstt_veh_h:       c.delta_tstt_veh_h,
            baseline_delay_veh_h:   c.baseline_delay_veh_h,
            scenario_delay_veh_h:   c.scenario_delay_veh_h,
            delta_delay_veh_h:      c.delta_delay_veh_h,
            delay_improvement_pct:  c.delay_improvement_pct,
            baseline_avg_delay_min: c.baseline_avg_delay_min,
            scenario_avg_delay_min: c.scenario_avg_delay_min,
            unreachable_od:         c.unreachable_od,
            missing_endpoint_od:    c.missing_endpoint_od,
        }
    }
}

// ── Bypass connectors ─────────────────────────────────────────────────────────

/// One evaluated bypass connector, with endpoint coordinates for mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorRow {
    pub scenario_id:           String,
    pub bottleneck:            String,
    pub a:                     u64,
    pub b:                     u64,
    pub a_lat:                 f64,
    pub a_lon:                 f64,
    pub b_lat:                 f64,
    pub b_lon:                 f64,
    pub length_m:              f64,
    pub score:                 f64,
    pub fallback:              bool,
    pub delta_delay_veh_h:     f64,
    pub delay_improvement_pct: f64,
}

impl Table for ConnectorRow {
    const NAME: &'static str = "connectors";
    const HEADERS: &'static [&'static str] = &[
        "scenario_id",
        "bottleneck",
        "a",
        "b",
        "a_lat",
        "a_lon",
        "b_lat",
        "b_lon",
        "length_m",
        "score",
        "fallback",
        "delta_delay_veh_h",
        "delay_improvement_pct",
    ];
}

impl From<&BypassResult> for ConnectorRow {
    fn from(r: &BypassResult) -> Self {
        let spec = &r.proposal.spec;
        Self {
            scenario_id:           r.comparison.scenario_id.clone(),
            bottleneck:            r.bottleneck.to_string(),
            a:                     spec.a.0,
            b:                     spec.b.0,
            a_lat:                 r.a_pos.lat,
            a_lon:                 r.a_pos.lon,
            b_lat:                 r.b_pos.lat,
            b_lon:                 r.b_pos.lon,
            length_m:              spec.length_m,
            score:                 r.proposal.score,
            fallback:              r.proposal.fallback,
            delta_delay_veh_h:     r.comparison.delta_delay_veh_h,
            delay_improvement_pct: r.comparison.delay_improvement_pct,
        }
    }
}

// ── Demand reduction ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReductionRow {
    pub reduction:           f64,
    pub factor:              f64,
    pub total_demand_vph:    f64,
    pub tstt_veh_h:          f64,
    pub delay_veh_h:         f64,
    pub avg_travel_min:      f64,
    pub avg_delay_min:       f64,
    pub delta_tstt_veh_h:    f64,
    pub delta_delay_veh_h:   f64,
    pub delta_avg_delay_min: f64,
}

impl Table for ReductionRow {
    const NAME: &'static str = "demand_reduction";
    const HEADERS: &'static [&'static str] = &[
        "reduction",
        "factor",
        "total_demand_vph",
        "tstt_veh_h",
        "delay_veh_h",
        "avg_travel_min",
        "avg_delay_min",
        "delta_tstt_veh_h",
        "delta_delay_veh_h",
        "delta_avg_delay_min",
    ];
}

impl From<&ReductionPoint> for ReductionRow {
    fn from(p: &ReductionPoint) -> Self {
        Self {
            reduction:           p.reduction,
            factor:              p.factor,
            total_demand_vph:    p.total_demand_vph,
            tstt_veh_h:          p.kpis.tstt_veh_h,
            delay_veh_h:         p.kpis.delay_veh_h,
            avg_travel_min:      p.kpis.avg_travel_min,
            avg_delay_min:       p.kpis.avg_delay_min,
            delta_tstt_veh_h:    p.delta_tstt_veh_h,
            delta_delay_veh_h:   p.delta_delay_veh_h,
            delta_avg_delay_min: p.delta_avg_delay_min,
        }
    }
}
