//! CSV network loader.
//!
//! # CSV format
//!
//! Two files, one for nodes and one for directed edges:
//!
//! ```csv
//! node_id,lat,lon
//! 1,18.0425,-63.0830
//! 2,18.0431,-63.0790
//! ```
//!
//! ```csv
//! from,to,key,length_m,maxspeed,lanes,highway,travel_time_s
//! 1,2,0,450.0,50,2,primary,
//! 2,1,0,450.0,"['40', '50']",2|3,primary,
//! ```
//!
//! Only `from` and `to` are required.  Every other edge column may be empty
//! or absent and is resolved by [`init_edge_attributes`].  A missing `key`
//! gets the next free parallel key for its node pair.
//!
//! Two-way streets appear as two rows, one per direction.

use std::io::Read;
use std::path::Path;

use log::info;
use serde::Deserialize;

use ta_core::{EdgeKey, GeoPoint, NetworkDefaults, NodeId};

use crate::attributes::{init_edge_attributes, RawEdgeAttrs};
use crate::network::{RoadNetwork, RoadNetworkBuilder};
use crate::{NetworkError, NetworkResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    node_id: u64,
    lat:     f64,
    lon:     f64,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from: u64,
    to:   u64,
    #[serde(default)]
    key: Option<u32>,
    #[serde(default)]
    length_m: Option<f64>,
    #[serde(default)]
    maxspeed: Option<String>,
    #[serde(default)]
    lanes: Option<String>,
    #[serde(default)]
    highway: Option<String>,
    #[serde(default)]
    travel_time_s: Option<f64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a network from a node file and an edge file.
pub fn load_network_csv(
    nodes_path: &Path,
    edges_path: &Path,
    defaults: &NetworkDefaults,
) -> NetworkResult<RoadNetwork> {
    let nodes = std::fs::File::open(nodes_path)?;
    let edges = std::fs::File::open(edges_path)?;
    let net = load_network_reader(nodes, edges, defaults)?;
    info!(
        "loaded network from {} / {}: {} nodes, {} edges",
        nodes_path.display(),
        edges_path.display(),
        net.node_count(),
        net.edge_count(),
    );
    Ok(net)
}

/// Like [`load_network_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`).
pub fn load_network_reader<N: Read, E: Read>(
    nodes: N,
    edges: E,
    defaults: &NetworkDefaults,
) -> NetworkResult<RoadNetwork> {
    let mut b = RoadNetworkBuilder::new();

    // ── Nodes ─────────────────────────────────────────────────────────────
    let mut node_reader = csv::Reader::from_reader(nodes);
    for result in node_reader.deserialize::<NodeRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        b.add_node(NodeId(row.node_id), GeoPoint::new(row.lat, row.lon))?;
    }

    // ── Edges ─────────────────────────────────────────────────────────────
    let mut edge_reader = csv::Reader::from_reader(edges);
    for result in edge_reader.deserialize::<EdgeRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let from = NodeId(row.from);
        let to = NodeId(row.to);
        let raw = RawEdgeAttrs {
            length_m:      row.length_m,
            maxspeed:      row.maxspeed,
            lanes:         row.lanes,
            highway:       row.highway,
            travel_time_s: row.travel_time_s,
        };
        let attrs = init_edge_attributes(&raw, defaults);
        match row.key {
            Some(k) => b.insert_edge(EdgeKey::new(from, to, k), attrs)?,
            None => {
                b.add_edge(from, to, attrs);
            }
        }
    }

    b.build()
}
