//! `ta-network`: road network, attribute initialization, ingestion and
//! shortest paths.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`network`]    | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`, `CostKind` |
//! | [`attributes`] | `HighwayClass`, `EdgeAttrs`, `init_edge_attributes`       |
//! | [`router`]     | `Router` trait, `DijkstraRouter`, `ShortestPathTree`, `Route` |
//! | [`loader`]     | `load_network_csv` (node + edge CSV files)                |
//! | [`error`]      | `NetworkError`, `NetworkResult<T>`                        |

pub mod attributes;
pub mod error;
pub mod loader;
pub mod network;
pub mod router;


pub use attributes::{init_edge_attributes, EdgeAttrs, HighwayClass, RawEdgeAttrs};
pub use error::{NetworkError, NetworkResult};
pub use loader::{load_network_csv, load_network_reader};
pub use network::{CostKind, RoadNetwork, RoadNetworkBuilder};
pub use router::{shortest_cost, DijkstraRouter, Route, Router, ShortestPathTree};
