//! Method of Successive Averages.
//!
//! ```text
//! flow := 0, time := t0
//! for k in 0..iters:
//!     time := bpr(flow)
//!     aux  := all_or_nothing(time)
//!     flow := flow + (aux − flow) / (k + 1)
//! time := bpr(flow)
//! ```
//!
//! The solver owns its working network: callers pass one in and get the
//! solved network back in [`Solved`].  Nothing else is mutated.

use log::{debug, info};

use ta_core::{BprParams, ModelConfig};
use ta_demand::OdPair;
use ta_network::{DijkstraRouter, RoadNetwork, Router};

use crate::aon::{all_or_nothing_with, AonStats};
use crate::cost::update_times;
use crate::{AssignError, AssignResult};

/// Denominator floor for the relative flow change.
const REL_CHANGE_EPS: f64 = 1e-9;

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct AssignParams {
    pub iters: usize,
    pub bpr: BprParams,
    /// Stop once `Σ|Δflow| / Σflow` falls below this (checked from the
    /// second iteration on).  `None` runs all `iters`.
    pub tolerance: Option<f64>,
}

impl AssignParams {
    /// Validated constructor.  `iters` is signed so that negative input from
    /// configuration surfaces as an error instead of wrapping.
    pub fn new(iters: i64, bpr: BprParams, tolerance: Option<f64>) -> AssignResult<Self> {
        let iters = usize::try_from(iters).map_err(|_| AssignError::NegativeIterations(iters))?;
        bpr.validate()?;
        if let Some(tol) = tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(AssignError::InvalidParameter(format!("tolerance must be > 0, got {tol}")));
            }
        }
        Ok(Self { iters, bpr, tolerance })
    }

    pub fn from_config(cfg: &ModelConfig) -> AssignResult<Self> {
        Self::new(cfg.msa_iters, cfg.bpr, cfg.msa_tolerance)
    }
}

impl Default for AssignParams {
    fn default() -> Self {
        Self { iters: 30, bpr: BprParams::default(), tolerance: None }
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolveReport {
    pub iterations_run: usize,
    /// Relative flow change of the last iteration; `None` if none ran.
    pub last_relative_change: Option<f64>,
    /// OD accounting from the last all-or-nothing step.
    pub aon: AonStats,
    pub converged_early: bool,
}

/// A solved network and how it got there.
#[derive(Clone)]
pub struct Solved {
    pub network: RoadNetwork,
    pub report: SolveReport,
}

// ── Solver ────────────────────────────────────────────────────────────────────

/// [`msa_assign_with`] using the default [`DijkstraRouter`].
pub fn msa_assign(network: RoadNetwork, od: &[OdPair], params: &AssignParams) -> AssignResult<Solved> {
    msa_assign_with(&DijkstraRouter, network, od, params)
}

/// Run MSA on `network` and return it with equilibrium flows and times.
///
/// With `params.iters == 0` the result has zero flow and free-flow times.
pub fn msa_assign_with<R: Router>(
    router: &R,
    network: RoadNetwork,
    od: &[OdPair],
    params: &AssignParams,
) -> AssignResult<Solved> {
    params.bpr.validate()?;

    let mut net = network;
    net.reset_flows();

    let present = od
        .iter()
        .filter(|p| net.contains_node(p.origin) && net.contains_node(p.destination))
        .count();
    info!(
        "MSA: {} OD pairs, {} with both endpoints in network, {} missing; {} iterations",
        od.len(),
        present,
        od.len() - present,
        params.iters,
    );

    let mut report = SolveReport::default();

    for k in 0..params.iters {
        update_times(&mut net, &params.bpr);
        let aon = all_or_nothing_with(router, &net, od);

        let step = 1.0 / (k + 1) as f64;
        let mut abs_change = 0.0;
        let mut total_flow = 0.0;
        for (flow, aux) in net.edge_flow_vph.iter_mut().zip(&aon.aux) {
            let delta = (aux - *flow) * step;
            *flow += delta;
            abs_change += delta.abs();
            total_flow += *flow;
        }
        let rel = abs_change / total_flow.max(REL_CHANGE_EPS);
        debug!("MSA iteration {}: relative flow change {rel:.6}", k + 1);

        report.iterations_run = k + 1;
        report.last_relative_change = Some(rel);
        report.aon = aon.stats;

        if let Some(tol) = params.tolerance {
            if k >= 1 && rel < tol {
                report.converged_early = true;
                break;
            }
        }
    }

    update_times(&mut net, &params.bpr);

    info!(
        "MSA done after {} iterations (assigned {}, unreachable {}, missing {})",
        report.iterations_run,
        report.aon.assigned,
        report.aon.unreachable,
        report.aon.missing_endpoint,
    );

    Ok(Solved { network: net, report })
}
