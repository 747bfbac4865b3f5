//! `ta-demand`: origin-destination demand.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`od`]        | `OdPair`, `scale_od`, `total_demand`                      |
//! | [`generate`]  | `node_weights`, `generate_od_weighted_total`              |
//! | [`loader`]    | `load_od_csv`, `load_od_reader`                           |
//! | [`error`]     | `DemandError`, `DemandResult<T>`                          |
//!
//! Demand is a static hourly matrix: one `OdPair` per trip relation, all in
//! vehicles/hour.  Generation is the only randomized step of a study and is
//! seeded from configuration.

pub mod error;
pub mod generate;
pub mod loader;
pub mod od;

#[cfg(test)]
mod tests;

pub use error::{DemandError, DemandResult};
pub use generate::{generate_from_config, generate_od_weighted_total, node_weights};
pub use loader::{load_od_csv, load_od_reader};
pub use od::{scale_od, total_demand, OdPair};
