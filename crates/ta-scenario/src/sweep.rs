//! Experiment sweeps over a [`ScenarioEngine`].
//!
//! Each sweep reports one [`ItemOutcome`] per input item, in input order.
//! A failing item is recorded as skipped with its reason; the sweep itself
//! keeps going.
//!
//! With the `parallel` feature, independent evaluations run on Rayon's
//! thread pool.  Output order is unchanged.

use log::{info, warn};
use rustc_hash::FxHashSet;

use ta_assign::{Bottleneck, SystemKpis};
use ta_core::{EdgeKey, GeoPoint, ProposerParams, ScenarioConfig};
use ta_demand::total_demand;
use ta_network::{RoadNetwork, Router};

use crate::connector::ConnectorSpec;
use crate::engine::{ScenarioComparison, ScenarioEngine};
use crate::proposer::{propose_connector_near_edge, Proposal};
use crate::scenario::Scenario;
use crate::ScenarioResult;

// ── Per-item outcome ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum ItemOutcome<T> {
    Done(T),
    Skipped { item: String, reason: String },
}

impl<T> ItemOutcome<T> {
    pub fn done(&self) -> Option<&T> {
        match self {
            ItemOutcome::Done(t) => Some(t),
            ItemOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ItemOutcome::Done(_))
    }

    fn skipped(item: impl Into<String>, reason: impl ToString) -> Self {
        let item = item.into();
        let reason = reason.to_string();
        warn!("skipping {item}: {reason}");
        ItemOutcome::Skipped { item, reason }
    }
}

/// Map `f` over `items`, on Rayon's pool when `parallel` is enabled.
fn map_items<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(f).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().map(f).collect()
    }
}

// ── Scenario catalogue ────────────────────────────────────────────────────────

/// A scenario with a stable identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogueEntry {
    pub id: String,
    pub scenario: Scenario,
}

/// The default catalogue:
///
/// - one capacity increase of `cap_pct` on each of the first `cap_top_k`
///   bottlenecks,
/// - a closure of the top bottleneck (`do_closure`),
/// - a connector between the lowest- and highest-id nodes (`do_connector`).
pub fn catalogue_from_config(
    base: &RoadNetwork,
    bottlenecks: &[Bottleneck],
    cfg: &ScenarioConfig,
) -> Vec<CatalogueEntry> {
    let mut out = Vec::new();

    for (i, b) in bottlenecks.iter().take(cfg.cap_top_k).enumerate() {
        out.push(CatalogueEntry {
            id: format!("CAP{:02}", i + 1),
            scenario: Scenario::IncreaseCapacity { edge: b.edge, pct: cfg.cap_pct },
        });
    }

    if cfg.do_closure {
        if let Some(top) = bottlenecks.first() {
            out.push(CatalogueEntry {
                id: "CLOSE01".to_owned(),
                scenario: Scenario::Closure { edge: top.edge },
            });
        }
    }

    if cfg.do_connector {
        if let (Some(&a), Some(&b)) = (base.node_ids.first(), base.node_ids.last()) {
            if a != b {
                let spec = ConnectorSpec::new(a, b, cfg.connector_length_m)
                    .with_design(cfg.connector_speed_kph, cfg.connector_lanes);
                out.push(CatalogueEntry {
                    id: "CONN01".to_owned(),
                    scenario: Scenario::AddConnector { spec, two_way: true },
                });
            }
        }
    }

    out
}

/// Evaluate every catalogue entry against the baseline.
pub fn run_catalogue<R: Router>(
    engine: &ScenarioEngine<R>,
    entries: &[CatalogueEntry],
) -> ScenarioResult<Vec<ItemOutcome<ScenarioComparison>>> {
    engine.baseline()?;
    let out = map_items(entries, |entry| match engine.evaluate(&entry.id, &entry.scenario) {
        Ok(o) => ItemOutcome::Done(o.comparison),
        Err(e) => ItemOutcome::skipped(entry.id.clone(), e),
    });
    info!(
        "catalogue: {} of {} scenarios evaluated",
        out.iter().filter(|o| o.is_done()).count(),
        out.len(),
    );
    Ok(out)
}

/// Sort comparisons best first: delay improvement descending, then id.
pub fn rank_by_improvement(comparisons: &mut [ScenarioComparison]) {
    comparisons.sort_by(|a, b| {
        b.delay_improvement_pct
            .total_cmp(&a.delay_improvement_pct)
            .then_with(|| a.scenario_id.cmp(&b.scenario_id))
    });
}

// ── Bottleneck bypass ─────────────────────────────────────────────────────────

/// One evaluated bypass connector.
#[derive(Clone, Debug, PartialEq)]
pub struct BypassResult {
    pub bottleneck: EdgeKey,
    pub proposal: Proposal,
    pub comparison: ScenarioComparison,
    pub a_pos: GeoPoint,
    pub b_pos: GeoPoint,
}

/// For each of the first `top_n` bottlenecks: propose a connector near it,
/// drop proposals whose undirected node pair was already proposed, and
/// evaluate the rest as two-way connectors.
pub fn bottleneck_bypass_sweep<R: Router>(
    engine: &ScenarioEngine<R>,
    bottlenecks: &[Bottleneck],
    top_n: usize,
    params: &ProposerParams,
) -> ScenarioResult<Vec<ItemOutcome<BypassResult>>> {
    engine.baseline()?;
    let base = engine.base();

    // Proposal and dedup are sequential: "already seen" depends on order.
    let mut seen = FxHashSet::default();
    let mut staged: Vec<Result<(String, EdgeKey, Proposal), ItemOutcome<BypassResult>>> = Vec::new();
    for (i, b) in bottlenecks.iter().take(top_n).enumerate() {
        let id = format!("BYPASS{:02}", i + 1);
        match propose_connector_near_edge(base, b.edge.from, b.edge.to, params) {
            Err(e) => staged.push(Err(ItemOutcome::skipped(id, e))),
            Ok(p) if !seen.insert(p.spec.undirected_pair()) => {
                let reason = format!("duplicate connector {} <-> {}", p.spec.a, p.spec.b);
                staged.push(Err(ItemOutcome::skipped(id, reason)));
            }
            Ok(p) => staged.push(Ok((id, b.edge, p))),
        }
    }

    let out = map_items(&staged, |item| match item {
        Err(skipped) => skipped.clone(),
        Ok((id, edge, proposal)) => {
            let scenario = Scenario::AddConnector { spec: proposal.spec.clone(), two_way: true };
            match engine.evaluate(id, &scenario) {
                Ok(o) => ItemOutcome::Done(BypassResult {
                    bottleneck: *edge,
                    proposal: proposal.clone(),
                    comparison: o.comparison,
                    a_pos: node_pos(base, proposal.spec.a),
                    b_pos: node_pos(base, proposal.spec.b),
                }),
                Err(e) => ItemOutcome::skipped(id.clone(), e),
            }
        }
    });

    info!(
        "bypass sweep: {} of {} bottlenecks produced an evaluated connector",
        out.iter().filter(|o| o.is_done()).count(),
        out.len(),
    );
    Ok(out)
}

/// Position of a proposed endpoint; NaN if it is not in `net`.
fn node_pos(net: &RoadNetwork, id: ta_core::NodeId) -> GeoPoint {
    net.node_idx(id).map_or(GeoPoint::new(f64::NAN, f64::NAN), |n| net.pos(n))
}

// ── Demand reduction ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct ReductionPoint {
    /// Reduction as a fraction of the reference demand.
    pub reduction: f64,
    /// Multiplier applied to the engine's OD list.
    pub factor: f64,
    pub total_demand_vph: f64,
    pub kpis: SystemKpis,
    /// Versus the reference (`od_factor`) run, vehicle-hours/hour.
    pub delta_tstt_veh_h: f64,
    pub delta_delay_veh_h: f64,
    /// Versus the reference run, minutes per vehicle.
    pub delta_avg_delay_min: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReductionSweep {
    /// KPIs at `od_factor`.
    pub reference: SystemKpis,
    pub points: Vec<ItemOutcome<ReductionPoint>>,
    /// Smallest reduction (in sweep order) whose average delay is at or
    /// below the target.
    pub first_meeting_target: Option<f64>,
}

/// Rescale demand to `od_factor − r` for each `r` in `reductions` and
/// record the resulting KPIs.
pub fn demand_reduction_sweep<R: Router>(
    engine: &ScenarioEngine<R>,
    reductions: &[f64],
    od_factor: f64,
    target_avg_delay_min: f64,
) -> ScenarioResult<ReductionSweep> {
    let reference = if od_factor == 1.0 {
        engine.baseline()?.kpis
    } else {
        engine.evaluate("REF", &Scenario::ScaleDemand { factor: od_factor })?.kpis
    };

    let points = map_items(reductions, |&r| {
        let factor = od_factor - r;
        let id = format!("REDUCE{:.0}", r * 100.0);
        if !factor.is_finite() || factor < 0.0 {
            return ItemOutcome::skipped(id, format!("demand factor {factor:.3} is negative"));
        }
        match engine.evaluate(&id, &Scenario::ScaleDemand { factor }) {
            Ok(o) => ItemOutcome::Done(ReductionPoint {
                reduction: r,
                factor,
                total_demand_vph: total_demand(engine.od()) * factor,
                kpis: o.kpis,
                delta_tstt_veh_h: o.kpis.tstt_veh_h - reference.tstt_veh_h,
                delta_delay_veh_h: o.kpis.delay_veh_h - reference.delay_veh_h,
                delta_avg_delay_min: o.kpis.avg_delay_min - reference.avg_delay_min,
            }),
            Err(e) => ItemOutcome::skipped(id, e),
        }
    });

    let first_meeting_target = points
        .iter()
        .filter_map(ItemOutcome::done)
        .find(|p| p.kpis.avg_delay_min <= target_avg_delay_min)
        .map(|p| p.reduction);

    match first_meeting_target {
        Some(r) => info!(
            "demand reduction: {:.0}% reaches {target_avg_delay_min:.2} min/veh average delay",
            r * 100.0
        ),
        None => info!("demand reduction: no sweep point reaches {target_avg_delay_min:.2} min/veh"),
    }

    Ok(ReductionSweep { reference, points, first_meeting_target })
}
