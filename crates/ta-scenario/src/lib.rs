//! `ta-scenario`: connector proposals, what-if scenarios, and sweeps.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`connector`] | `ConnectorSpec`, `apply_connector`                            |
//! | [`proposer`]  | `propose_connector_near_edge`, `shortest_path_relief_connectors` |
//! | [`scenario`]  | `Scenario` (capacity, closure, connector, demand scale)       |
//! | [`engine`]    | `ScenarioEngine`, `Baseline`, `ScenarioComparison`            |
//! | [`sweep`]     | `run_catalogue`, `bottleneck_bypass_sweep`, `demand_reduction_sweep` |
//! | [`error`]     | `ProposerError`, `ScenarioError`                              |
//!
//! # Evaluation flow
//!
//! ```text
//! base ──clone──► Scenario::apply ──► msa_assign ──► SystemKpis ─┐
//!   │                                                            ├─► ScenarioComparison
//!   └──clone──────────────────────► msa_assign ──► SystemKpis ───┘   (baseline, cached)
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Evaluates independent sweep items on Rayon's pool.     |

pub mod connector;
pub mod engine;
pub mod error;
pub mod proposer;
pub mod scenario;
pub mod sweep;

#[cfg(test)]
mod tests;

pub use connector::{apply_connector, ConnectorSpec, DEFAULT_CONNECTOR_CAPACITY_PER_LANE, DEFAULT_CONNECTOR_NAME};
pub use engine::{Baseline, ScenarioComparison, ScenarioEngine, ScenarioOutcome};
pub use error::{ProposerError, ProposerResult, ScenarioError, ScenarioResult};
pub use proposer::{propose_connector_near_edge, shortest_path_relief_connectors, Proposal, ScoredConnector};
pub use scenario::Scenario;
pub use sweep::{
    bottleneck_bypass_sweep, catalogue_from_config, demand_reduction_sweep, rank_by_improvement,
    run_catalogue, BypassResult, CatalogueEntry, ItemOutcome, ReductionPoint, ReductionSweep,
};
