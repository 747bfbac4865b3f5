//! All-or-nothing loading.
//!
//! Every OD demand is placed entirely on the current shortest path (by
//! congested time).  One one-to-all tree is built per distinct origin and
//! shared by all of that origin's destinations.
//!
//! The tree already encodes the parallel-edge rule: Dijkstra scans a node's
//! outgoing edges in edge-identifier order and only accepts strict
//! improvements, so between consecutive path nodes the cheapest parallel
//! edge wins and ties go to the lowest key.

use std::collections::BTreeMap;

use log::debug;

use ta_core::NodeIdx;
use ta_demand::OdPair;
use ta_network::{CostKind, DijkstraRouter, RoadNetwork, Router};

/// Per-call OD accounting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AonStats {
    /// Pairs loaded onto a path.
    pub assigned: usize,
    /// Pairs with an origin or destination absent from the network.
    pub missing_endpoint: usize,
    /// Pairs with no path from origin to destination.
    pub unreachable: usize,
    /// Pairs with origin == destination (no flow).
    pub trivial: usize,
}

impl AonStats {
    /// Pairs whose endpoints are both present.
    pub fn present(&self) -> usize {
        self.assigned + self.unreachable + self.trivial
    }
}

#[derive(Clone, Debug)]
pub struct AonResult {
    /// Auxiliary flow per edge index, vehicles/hour.
    pub aux: Vec<f64>,
    pub stats: AonStats,
}

/// [`all_or_nothing_with`] using the default [`DijkstraRouter`].
pub fn all_or_nothing(net: &RoadNetwork, od: &[OdPair]) -> AonResult {
    all_or_nothing_with(&DijkstraRouter, net, od)
}

/// Load every OD pair onto its current shortest path.
pub fn all_or_nothing_with<R: Router>(router: &R, net: &RoadNetwork, od: &[OdPair]) -> AonResult {
    let mut aux = vec![0.0; net.edge_count()];
    let mut stats = AonStats::default();

    // Group destinations by origin; BTreeMap keeps origin order stable.
    let mut by_origin: BTreeMap<NodeIdx, Vec<(NodeIdx, f64)>> = BTreeMap::new();
    for pair in od {
        let (Some(o), Some(d)) = (net.node_idx(pair.origin), net.node_idx(pair.destination)) else {
            debug!("OD {} -> {}: endpoint not in network", pair.origin, pair.destination);
            stats.missing_endpoint += 1;
            continue;
        };
        if o == d {
            stats.trivial += 1;
            continue;
        }
        by_origin.entry(o).or_default().push((d, pair.demand_vph));
    }

    for (origin, dests) in by_origin {
        let tree = router.tree(net, origin, CostKind::Congested);
        for (dest, demand) in dests {
            match tree.path_to(net, dest) {
                Some(path) => {
                    for e in path {
                        aux[e.index()] += demand;
                    }
                    stats.assigned += 1;
                }
                None => {
                    debug!(
                        "OD {} -> {}: no path",
                        net.node_id(origin),
                        net.node_id(dest),
                    );
                    stats.unreachable += 1;
                }
            }
        }
    }

    AonResult { aux, stats }
}
