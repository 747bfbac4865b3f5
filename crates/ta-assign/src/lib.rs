//! `ta-assign`: static traffic assignment.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | [`cost`]    | `bpr_time`, `update_times`                                        |
//! | [`aon`]     | `all_or_nothing`: shortest-path loading, `AonStats`              |
//! | [`msa`]     | `msa_assign`, `AssignParams`, `Solved`, `SolveReport`             |
//! | [`metrics`] | TSTT, total delay, `SystemKpis`, `top_bottlenecks`                |
//! | [`error`]   | `AssignError`, `AssignResult<T>`                                  |
//!
//! # Pipeline
//!
//! ```text
//! RoadNetwork ─► msa_assign ─► Solved { network, report }
//!                   │  ├─ update_times   (BPR)
//!                   │  └─ all_or_nothing (Dijkstra per origin)
//!                   ▼
//!            SystemKpis / top_bottlenecks
//! ```
//!
//! Routing goes through the [`ta_network::Router`] trait; the `_with`
//! variants accept a custom router.

pub mod aon;
pub mod cost;
pub mod error;
pub mod metrics;
pub mod msa;

#[cfg(test)]
mod tests;

pub use aon::{all_or_nothing, all_or_nothing_with, AonResult, AonStats};
pub use cost::{bpr_time, update_times, CAPACITY_FLOOR_VPH};
pub use error::{AssignError, AssignResult};
pub use metrics::{
    bottleneck_order, top_bottlenecks, total_delay_s, total_system_travel_time_s, Bottleneck,
    SystemKpis,
};
pub use msa::{msa_assign, msa_assign_with, AssignParams, SolveReport, Solved};
