//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The assignment and connector crates reach shortest paths through the
//! [`Router`] trait, so a faster engine (A*, contraction hierarchies) can be
//! swapped in without touching them.  [`DijkstraRouter`] is the default.
//!
//! # Determinism
//!
//! Relaxation only accepts a **strictly** smaller tentative cost, and the
//! outgoing edges of a node are scanned in edge-identifier order.  Among
//! equal-cost paths the one discovered first is kept, which makes every
//! tree and route a pure function of the network and its current times.
//!
//! # Cost units
//!
//! All costs are seconds (`f64`), either congested or free-flow as chosen
//! by [`CostKind`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use ta_core::{EdgeIdx, NodeId, NodeIdx};

use crate::network::{CostKind, RoadNetwork};
use crate::{NetworkError, NetworkResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a point-to-point query: an ordered list of edges and the
/// total cost.
#[derive(Debug, Clone)]
pub struct Route {
    pub origin: NodeIdx,
    /// Edges to traverse in order, from origin to destination.
    pub edges: Vec<EdgeIdx>,
    /// Sum of edge costs, seconds.
    pub total_s: f64,
}

impl Route {
    /// `true` if origin and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Node sequence visited by the route, origin first.
    pub fn nodes(&self, network: &RoadNetwork) -> Vec<NodeIdx> {
        let mut out = Vec::with_capacity(self.edges.len() + 1);
        out.push(self.origin);
        out.extend(self.edges.iter().map(|e| network.edge_to[e.index()]));
        out
    }
}

// ── ShortestPathTree ──────────────────────────────────────────────────────────

/// One-to-all result of a single Dijkstra run.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    pub origin: NodeIdx,
    /// Best cost to each node; `f64::INFINITY` where unreached.
    pub dist: Vec<f64>,
    /// Edge that reached each node; `EdgeIdx::INVALID` for the origin and
    /// for unreached nodes.
    pub prev_edge: Vec<EdgeIdx>,
}

impl ShortestPathTree {
    #[inline]
    pub fn reached(&self, node: NodeIdx) -> bool {
        self.dist[node.index()].is_finite()
    }

    #[inline]
    pub fn cost_to(&self, node: NodeIdx) -> Option<f64> {
        let d = self.dist[node.index()];
        d.is_finite().then_some(d)
    }

    /// Edge sequence from the origin to `node`.  Empty for the origin itself,
    /// `None` if `node` is unreached.
    pub fn path_to(&self, network: &RoadNetwork, node: NodeIdx) -> Option<Vec<EdgeIdx>> {
        if !self.reached(node) {
            return None;
        }
        let mut edges = Vec::new();
        let mut cur = node;
        loop {
            let e = self.prev_edge[cur.index()];
            if e == EdgeIdx::INVALID {
                break;
            }
            edges.push(e);
            cur = network.edge_from[e.index()];
        }
        edges.reverse();
        Some(edges)
    }

    /// Like [`path_to`](Self::path_to) but packaged as a [`Route`].
    pub fn route_to(&self, network: &RoadNetwork, node: NodeIdx) -> Option<Route> {
        let edges = self.path_to(network, node)?;
        Some(Route { origin: self.origin, edges, total_s: self.dist[node.index()] })
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so they can be shared across Rayon
/// worker threads when scenarios are evaluated in parallel.
pub trait Router: Send + Sync {
    /// One-to-all shortest paths from `origin`.
    fn tree(&self, network: &RoadNetwork, origin: NodeIdx, kind: CostKind) -> ShortestPathTree;

    /// Point-to-point shortest path between two external node ids.
    ///
    /// `from == to` yields an empty route.
    ///
    /// # Errors
    ///
    /// [`NetworkError::NodeNotFound`] if either id is absent;
    /// [`NetworkError::NoRoute`] if `to` is unreachable.
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId, kind: CostKind) -> NetworkResult<Route> {
        let a = network.node_idx(from).ok_or(NetworkError::NodeNotFound(from))?;
        let b = network.node_idx(to).ok_or(NetworkError::NodeNotFound(to))?;
        self.tree(network, a, kind)
            .route_to(network, b)
            .ok_or(NetworkError::NoRoute { from, to })
    }
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Binary-heap Dijkstra over the CSR road graph.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn tree(&self, network: &RoadNetwork, origin: NodeIdx, kind: CostKind) -> ShortestPathTree {
        dijkstra(network, origin, None, kind)
    }

    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId, kind: CostKind) -> NetworkResult<Route> {
        let a = network.node_idx(from).ok_or(NetworkError::NodeNotFound(from))?;
        let b = network.node_idx(to).ok_or(NetworkError::NodeNotFound(to))?;
        dijkstra(network, a, Some(b), kind)
            .route_to(network, b)
            .ok_or(NetworkError::NoRoute { from, to })
    }
}

/// Shortest cost from `from` to `to`, or `None` if unreachable.
pub fn shortest_cost(network: &RoadNetwork, from: NodeIdx, to: NodeIdx, kind: CostKind) -> Option<f64> {
    dijkstra(network, from, Some(to), kind).cost_to(to)
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Settle nodes outward from `origin`; stop early once `target` is settled.
fn dijkstra(network: &RoadNetwork, origin: NodeIdx, target: Option<NodeIdx>, kind: CostKind) -> ShortestPathTree {
    let n = network.node_count();
    let mut dist      = vec![f64::INFINITY; n];
    let mut prev_edge = vec![EdgeIdx::INVALID; n];

    dist[origin.index()] = 0.0;

    // Min-heap: (cost, node).  Reverse turns the max-heap into a min-heap;
    // the NodeIdx secondary key fixes the pop order among equal costs.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeIdx)>> = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), origin)));

    while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }
        if target == Some(node) {
            break;
        }

        for edge in network.out_edges(node) {
            let next = network.edge_to[edge.index()];
            let new_cost = cost + network.edge_cost(edge, kind);

            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_edge[next.index()] = edge;
                heap.push(Reverse((OrderedFloat(new_cost), next)));
            }
        }
    }

    ShortestPathTree { origin, dist, prev_edge }
}
