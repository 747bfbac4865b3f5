//! Baseline-versus-scenario evaluation.

use std::sync::OnceLock;

use log::{info, warn};

use ta_assign::{
    msa_assign_with, top_bottlenecks, AonStats, AssignParams, Bottleneck, Solved, SystemKpis,
};
use ta_demand::{total_demand, OdPair};
use ta_network::{DijkstraRouter, RoadNetwork, Router};

use crate::connector::DEFAULT_CONNECTOR_CAPACITY_PER_LANE;
use crate::scenario::Scenario;
use crate::ScenarioResult;

/// The solved, unmutated network and its KPIs.
#[derive(Clone)]
pub struct Baseline {
    pub solved: Solved,
    pub kpis: SystemKpis,
}

/// One scenario compared against the baseline.  Network totals are
/// vehicle-hours per hour; averages are minutes per vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioComparison {
    pub scenario_id: String,
    pub name: String,
    pub kind: &'static str,
    pub description: String,
    pub baseline_tstt_veh_h: f64,
    pub scenario_tstt_veh_h: f64,
    pub delta_tstt_veh_h: f64,
    pub baseline_delay_veh_h: f64,
    pub scenario_delay_veh_h: f64,
    pub delta_delay_veh_h: f64,
    /// `−Δdelay / baseline_delay × 100`; 0 when the baseline has no delay.
    pub delay_improvement_pct: f64,
    pub baseline_avg_delay_min: f64,
    pub scenario_avg_delay_min: f64,
    /// OD pairs of the scenario run with no path.  Their demand carries no
    /// flow, so delay figures exclude it.
    pub unreachable_od: usize,
    /// OD pairs of the scenario run whose origin or destination is not in
    /// the network.
    pub missing_endpoint_od: usize,
}

impl ScenarioComparison {
    pub fn new(
        scenario_id: impl Into<String>,
        scenario: &Scenario,
        baseline: &SystemKpis,
        variant: &SystemKpis,
    ) -> Self {
        let delta_delay = variant.delay_veh_h - baseline.delay_veh_h;
        let delay_improvement_pct = if baseline.delay_veh_h > 0.0 {
            -delta_delay / baseline.delay_veh_h * 100.0
        } else {
            0.0
        };
        Self {
            scenario_id: scenario_id.into(),
            name: scenario.name(),
            kind: scenario.kind(),
            description: scenario.description(),
            baseline_tstt_veh_h: baseline.tstt_veh_h,
            scenario_tstt_veh_h: variant.tstt_veh_h,
            delta_tstt_veh_h: variant.tstt_veh_h - baseline.tstt_veh_h,
            baseline_delay_veh_h: baseline.delay_veh_h,
            scenario_delay_veh_h: variant.delay_veh_h,
            delta_delay_veh_h: delta_delay,
            delay_improvement_pct,
            baseline_avg_delay_min: baseline.avg_delay_min,
            scenario_avg_delay_min: variant.avg_delay_min,
            unreachable_od: 0,
            missing_endpoint_od: 0,
        }
    }

    /// Record the scenario run's OD accounting.
    pub fn with_aon_stats(mut self, stats: &AonStats) -> Self {
        self.unreachable_od = stats.unreachable;
        self.missing_endpoint_od = stats.missing_endpoint;
        self
    }

    /// True when some scenario demand could not be loaded.
    pub fn has_stranded_demand(&self) -> bool {
        self.unreachable_od + self.missing_endpoint_od > 0
    }
}

/// Full result of one evaluation.
#[derive(Clone)]
pub struct ScenarioOutcome {
    pub comparison: ScenarioComparison,
    pub solved: Solved,
    pub kpis: SystemKpis,
}

/// Evaluates scenarios against a shared base network and demand.
///
/// The base network is never mutated.  The baseline is solved at most once
/// and cached.
///
/// # Type parameter
///
/// `R` is the shortest-path engine used by every solve.
pub struct ScenarioEngine<R: Router = DijkstraRouter> {
    base: RoadNetwork,
    od: Vec<OdPair>,
    params: AssignParams,
    connector_capacity_per_lane: f64,
    router: R,
    baseline: OnceLock<Baseline>,
}

impl ScenarioEngine<DijkstraRouter> {
    pub fn new(base: RoadNetwork, od: Vec<OdPair>, params: AssignParams) -> Self {
        Self::with_router(DijkstraRouter, base, od, params)
    }
}

impl<R: Router> ScenarioEngine<R> {
    pub fn with_router(router: R, base: RoadNetwork, od: Vec<OdPair>, params: AssignParams) -> Self {
        Self {
            base,
            od,
            params,
            connector_capacity_per_lane: DEFAULT_CONNECTOR_CAPACITY_PER_LANE,
            router,
            baseline: OnceLock::new(),
        }
    }

    /// Capacity per lane given to connectors built by scenarios.
    pub fn with_connector_capacity_per_lane(mut self, vph: f64) -> Self {
        self.connector_capacity_per_lane = vph;
        self
    }

    pub fn base(&self) -> &RoadNetwork {
        &self.base
    }

    pub fn od(&self) -> &[OdPair] {
        &self.od
    }

    pub fn params(&self) -> &AssignParams {
        &self.params
    }

    /// Solve the unmutated network (first call only) and return it.
    pub fn baseline(&self) -> ScenarioResult<&Baseline> {
        if let Some(b) = self.baseline.get() {
            return Ok(b);
        }
        let solved = msa_assign_with(&self.router, self.base.clone(), &self.od, &self.params)?;
        let kpis = SystemKpis::from_network(&solved.network, total_demand(&self.od));
        info!(
            "baseline: TSTT {:.2} veh-h, delay {:.2} veh-h, {:.2} min/veh delay",
            kpis.tstt_veh_h, kpis.delay_veh_h, kpis.avg_delay_min,
        );
        Ok(self.baseline.get_or_init(|| Baseline { solved, kpis }))
    }

    /// The `n` worst edges of the baseline.
    pub fn baseline_bottlenecks(&self, n: usize) -> ScenarioResult<Vec<Bottleneck>> {
        Ok(top_bottlenecks(&self.baseline()?.solved.network, n))
    }

    /// Apply `scenario` to a copy of the base, solve, and compare with the
    /// baseline.
    pub fn evaluate(&self, scenario_id: &str, scenario: &Scenario) -> ScenarioResult<ScenarioOutcome> {
        let baseline = self.baseline()?;

        let net = scenario.apply_with(&self.base, self.connector_capacity_per_lane)?;
        let od = scenario.apply_demand(&self.od)?;
        let solved = msa_assign_with(&self.router, net, &od, &self.params)?;
        let kpis = SystemKpis::from_network(&solved.network, total_demand(&od));

        let comparison = ScenarioComparison::new(scenario_id, scenario, &baseline.kpis, &kpis)
            .with_aon_stats(&solved.report.aon);
        if comparison.has_stranded_demand() {
            warn!(
                "{scenario_id}: {} OD pairs unreachable, {} with missing endpoints; their demand is not assigned",
                comparison.unreachable_od, comparison.missing_endpoint_od,
            );
        }
        info!(
            "{scenario_id} {}: delay {:.2} -> {:.2} veh-h ({:+.1}%)",
            comparison.name,
            comparison.baseline_delay_veh_h,
            comparison.scenario_delay_veh_h,
            comparison.delay_improvement_pct,
        );
        Ok(ScenarioOutcome { comparison, solved, kpis })
    }
}
