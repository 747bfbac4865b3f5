//! `ta-core`: foundational types for the traffic assignment workspace.
//!
//! This crate is a dependency of every other `ta-*` crate.  It has no
//! `ta-*` dependencies and few external ones (`rand`, `thiserror`, `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`ids`]       | `NodeId`, `EdgeKey`, dense `NodeIdx` / `EdgeIdx`        |
//! | [`geo`]       | `GeoPoint`, haversine distance                          |
//! | [`units`]     | seconds / hours / minutes conversions for reporting     |
//! | [`config`]    | `ModelConfig` and its parameter sections                |
//! | [`rng`]       | `SimRng` (seeded, reproducible)                         |
//! | [`error`]     | `TaError`, `TaResult`                                   |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod units;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    BprParams, BypassConfig, DemandConfig, ModelConfig, NetworkDefaults, ProposerParams,
    ReductionConfig, ScenarioConfig,
};
pub use error::{TaError, TaResult};
pub use geo::GeoPoint;
pub use ids::{EdgeIdx, EdgeKey, NodeId, NodeIdx};
pub use rng::SimRng;
