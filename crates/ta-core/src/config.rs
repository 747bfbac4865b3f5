//! Model configuration.
//!
//! All parameters are supplied from outside the core and threaded through
//! every call explicitly; nothing here is global.  Every field has a
//! default, so a config file only needs to name what it overrides:
//!
//! ```json
//! { "msa_iters": 50, "bpr": { "beta": 5.0 }, "demand": { "n_pairs": 400 } }
//! ```
//!
//! [`ModelConfig::validate`] rejects values that would silently invalidate
//! every downstream result (negative iteration counts, non-positive
//! capacities or speeds, non-finite congestion parameters).  Nothing is
//! clamped.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{TaError, TaResult};

// ── BPR ───────────────────────────────────────────────────────────────────────

/// Parameters of the BPR volume-delay function
/// `t = t0 · (1 + alpha · (v/c)^beta)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BprParams {
    /// Congestion sensitivity.  Default: 0.15.
    pub alpha: f64,
    /// Congestion curvature.  Default: 4.0.
    pub beta: f64,
}

impl Default for BprParams {
    fn default() -> Self {
        Self { alpha: 0.15, beta: 4.0 }
    }
}

impl BprParams {
    pub fn validate(&self) -> TaResult<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(TaError::Config(format!("bpr.alpha must be finite and >= 0, got {}", self.alpha)));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(TaError::Config(format!("bpr.beta must be finite and >= 0, got {}", self.beta)));
        }
        Ok(())
    }
}

// ── Network defaults ──────────────────────────────────────────────────────────

/// Substitutes for road attributes missing from the source data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDefaults {
    /// Speed assumed when `maxspeed` is absent or unparsable.  Default: 40 kph.
    pub default_speed_kph: f64,
    /// Capacity per lane when the highway class is not in the lookup table.
    /// Default: 900 vph.
    pub default_capacity_per_lane: f64,
    /// Lower bound on parsed speeds.  Default: 5 kph.
    pub min_speed_kph: f64,
    /// Length assumed when an edge carries none.  Default: 50 m.
    pub default_length_m: f64,
    /// Lower bound on derived capacities.  Default: 50 vph.
    pub min_capacity_vph: f64,
}

impl Default for NetworkDefaults {
    fn default() -> Self {
        Self {
            default_speed_kph:         40.0,
            default_capacity_per_lane: 900.0,
            min_speed_kph:             5.0,
            default_length_m:          50.0,
            min_capacity_vph:          50.0,
        }
    }
}

// ── Demand ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Number of OD pairs drawn by the weighted generator.  Default: 250.
    pub n_pairs: usize,
    /// Sum of all generated demands, vehicles/hour.  Default: 8000.
    pub total_demand_vph: f64,
    /// Generator seed.  The same seed always produces the same OD list.
    pub seed: u64,
    /// Multiplier applied to the baseline OD before reduction sweeps.
    /// Default: 1.0.
    pub od_factor: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self { n_pairs: 250, total_demand_vph: 8_000.0, seed: 42, od_factor: 1.0 }
    }
}

// ── Connector proposer ────────────────────────────────────────────────────────

/// Thresholds and defaults for both connector-proposal heuristics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposerParams {
    /// Radius of the undirected hop neighbourhood around each bottleneck
    /// endpoint.  Default: 3.
    pub k_hops: usize,
    /// Longest straight-line connector the near-edge search accepts.
    /// Default: 300 m.
    pub max_straight_m: f64,
    /// Stop scoring after this many candidates.  Default: 800.
    pub max_pairs: usize,
    /// Detour assumed for pairs with no existing path.  Default: 10 000 s.
    pub disconnected_detour_s: f64,
    /// Straight-line distance floor in the detour score denominator.
    /// Default: 10 m.
    pub min_straight_m: f64,
    /// Path positions inspected before the bottleneck.  Default: 2.
    pub relief_k_back: usize,
    /// Path positions inspected after the bottleneck.  Default: 2.
    pub relief_k_fwd: usize,
    /// Longest straight-line relief connector.  Default: 350 m.
    pub relief_max_straight_m: f64,
    /// Relief candidates returned per bottleneck.  Default: 8.
    pub relief_top_k: usize,
    /// Assumed connector design speed.  Default: 40 kph.
    pub speed_kph: f64,
    /// Assumed connector lane count.  Default: 1.
    pub lanes: f64,
}

impl Default for ProposerParams {
    fn default() -> Self {
        Self {
            k_hops:                3,
            max_straight_m:        300.0,
            max_pairs:             800,
            disconnected_detour_s: 10_000.0,
            min_straight_m:        10.0,
            relief_k_back:         2,
            relief_k_fwd:          2,
            relief_max_straight_m: 350.0,
            relief_top_k:          8,
            speed_kph:             40.0,
            lanes:                 1.0,
        }
    }
}

// ── Scenario catalogue / sweeps ───────────────────────────────────────────────

/// Controls the default scenario catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Number of capacity-increase scenarios (one per top bottleneck).
    pub cap_top_k: usize,
    /// Fractional capacity increase, e.g. 0.25 = +25 %.
    pub cap_pct: f64,
    pub do_closure: bool,
    pub do_connector: bool,
    pub connector_length_m: f64,
    pub connector_speed_kph: f64,
    pub connector_lanes: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            cap_top_k:           5,
            cap_pct:             0.25,
            do_closure:          true,
            do_connector:        true,
            connector_length_m:  350.0,
            connector_speed_kph: 40.0,
            connector_lanes:     1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BypassConfig {
    /// Bottlenecks considered by the connector sweep.  Default: 10.
    pub top_n_bottlenecks: usize,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self { top_n_bottlenecks: 10 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Demand reductions to evaluate, as fractions of the baseline.
    pub reductions: Vec<f64>,
    /// Average delay per vehicle (minutes) the sweep tries to reach.
    pub target_avg_delay_min: f64,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            reductions:           vec![0.05, 0.10, 0.15, 0.20, 0.25, 0.30, 0.40, 0.50],
            target_avg_delay_min: 1.0,
        }
    }
}

// ── ModelConfig ───────────────────────────────────────────────────────────────

/// Top-level configuration for one study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub bpr: BprParams,
    /// MSA iteration budget.  Signed so that a negative value in a config
    /// file is reported rather than wrapped.  Default: 30.
    pub msa_iters: i64,
    /// Optional early-stop tolerance on the relative flow change.  `None`
    /// (the default) runs exactly `msa_iters` iterations.
    pub msa_tolerance: Option<f64>,
    pub network: NetworkDefaults,
    pub demand: DemandConfig,
    pub proposer: ProposerParams,
    pub scenarios: ScenarioConfig,
    pub bypass: BypassConfig,
    pub reduction: ReductionConfig,
    /// Rows in the baseline bottleneck table.  Default: 50.
    pub baseline_top_n_bottlenecks: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            bpr:                        BprParams::default(),
            msa_iters:                  30,
            msa_tolerance:              None,
            network:                    NetworkDefaults::default(),
            demand:                     DemandConfig::default(),
            proposer:                   ProposerParams::default(),
            scenarios:                  ScenarioConfig::default(),
            bypass:                     BypassConfig::default(),
            reduction:                  ReductionConfig::default(),
            baseline_top_n_bottlenecks: 50,
        }
    }
}

impl ModelConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(s: &str) -> TaResult<Self> {
        let cfg: ModelConfig =
            serde_json::from_str(s).map_err(|e| TaError::Parse(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_path(path: &Path) -> TaResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject configurations that cannot produce meaningful results.
    pub fn validate(&self) -> TaResult<()> {
        self.bpr.validate()?;

        if self.msa_iters < 0 {
            return Err(TaError::Config(format!("msa_iters must be >= 0, got {}", self.msa_iters)));
        }
        if let Some(tol) = self.msa_tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(TaError::Config(format!("msa_tolerance must be > 0, got {tol}")));
            }
        }

        let net = &self.network;
        positive("network.default_speed_kph", net.default_speed_kph)?;
        positive("network.default_capacity_per_lane", net.default_capacity_per_lane)?;
        positive("network.min_speed_kph", net.min_speed_kph)?;
        positive("network.min_capacity_vph", net.min_capacity_vph)?;
        non_negative("network.default_length_m", net.default_length_m)?;

        non_negative("demand.total_demand_vph", self.demand.total_demand_vph)?;
        non_negative("demand.od_factor", self.demand.od_factor)?;

        let p = &self.proposer;
        non_negative("proposer.max_straight_m", p.max_straight_m)?;
        non_negative("proposer.relief_max_straight_m", p.relief_max_straight_m)?;
        non_negative("proposer.disconnected_detour_s", p.disconnected_detour_s)?;
        positive("proposer.min_straight_m", p.min_straight_m)?;
        positive("proposer.speed_kph", p.speed_kph)?;
        positive("proposer.lanes", p.lanes)?;

        let s = &self.scenarios;
        if !s.cap_pct.is_finite() || s.cap_pct <= -1.0 {
            return Err(TaError::Config(format!("scenarios.cap_pct must be > -1, got {}", s.cap_pct)));
        }
        non_negative("scenarios.connector_length_m", s.connector_length_m)?;
        positive("scenarios.connector_speed_kph", s.connector_speed_kph)?;
        positive("scenarios.connector_lanes", s.connector_lanes)?;

        for &r in &self.reduction.reductions {
            if !r.is_finite() {
                return Err(TaError::Config(format!("reduction.reductions contains {r}")));
            }
        }

        Ok(())
    }
}

fn positive(name: &str, v: f64) -> TaResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(TaError::Config(format!("{name} must be > 0, got {v}")))
    }
}

fn non_negative(name: &str, v: f64) -> TaResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(TaError::Config(format!("{name} must be >= 0, got {v}")))
    }
}
