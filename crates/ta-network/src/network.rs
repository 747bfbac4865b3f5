//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph is a directed multigraph stored in **Compressed Sparse Row
//! (CSR)** format.  Nodes get dense indices in ascending `NodeId` order and
//! edges are sorted by `EdgeKey` `(from, to, key)`, so:
//!
//! ```text
//! outgoing edges of n  = EdgeIdx node_out_start[n] .. node_out_start[n+1]
//! incoming edges of n  = in_edge_list[ node_in_start[n] .. node_in_start[n+1] ]
//! ```
//!
//! Parallel edges between one ordered node pair are adjacent, in ascending
//! `key` order.  Comparing `NodeIdx` values is therefore equivalent to
//! comparing `NodeId`s, and scanning edges in index order is scanning them
//! in edge-identifier order.  Both properties are what make tie-breaks
//! deterministic everywhere downstream.
//!
//! # Mutable state
//!
//! Topology and the fixed attributes (`length`, `t0`, `capacity`) never
//! change after [`RoadNetworkBuilder::build`].  Only `edge_flow_vph` and
//! `edge_time_s` are rewritten, by the equilibrium solver on the copy it
//! owns.  Topology edits (closures, new connectors) go through
//! [`RoadNetwork::to_builder`] and produce a fresh network.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over `[lat, lon]` answers radius queries for
//! the connector search.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use ta_core::{EdgeIdx, EdgeKey, GeoPoint, NodeId, NodeIdx};

use crate::attributes::{EdgeAttrs, HighwayClass};
use crate::{NetworkError, NetworkResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[lat, lon]` point with
/// the associated node index.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    idx:   NodeIdx,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Only used for
    /// candidate pre-selection; exact filtering uses haversine.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Cost selector ─────────────────────────────────────────────────────────────

/// Which per-edge time a shortest-path query minimizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CostKind {
    /// Current congested time (`edge_time_s`).
    Congested,
    /// Free-flow time `t0` (`edge_free_flow_s`).  Measures network structure
    /// independent of the current flow state.
    FreeFlow,
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road multigraph in CSR format with per-edge cost attributes.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`].
#[derive(Clone)]
pub struct RoadNetwork {
    // ── Node data (indexed by NodeIdx) ────────────────────────────────────
    /// External identifier of each node, ascending.
    pub node_ids: Vec<NodeId>,
    /// Geographic position of each node.
    pub node_pos: Vec<GeoPoint>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// Outgoing edges of node `n` are `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,
    /// Row pointer into `in_edge_list`.  Length = `node_count + 1`.
    pub node_in_start: Vec<u32>,
    /// Edge indices grouped by destination node.
    pub in_edge_list: Vec<EdgeIdx>,

    // ── Edge data (indexed by EdgeIdx, sorted by EdgeKey) ─────────────────
    pub edge_key: Vec<EdgeKey>,
    pub edge_from: Vec<NodeIdx>,
    pub edge_to: Vec<NodeIdx>,
    /// Physical length, metres.
    pub edge_length_m: Vec<f64>,
    /// Free-flow time `t0`, seconds.
    pub edge_free_flow_s: Vec<f64>,
    /// Practical capacity, vehicles/hour.
    pub edge_capacity_vph: Vec<f64>,
    pub edge_lanes: Vec<f64>,
    pub edge_highway: Vec<HighwayClass>,

    // ── Assignment state ──────────────────────────────────────────────────
    /// Assigned flow, vehicles/hour.
    pub edge_flow_vph: Vec<f64>,
    /// Congested travel time, seconds.  Always ≥ `edge_free_flow_s`.
    pub edge_time_s: Vec<f64>,

    node_lookup: FxHashMap<NodeId, NodeIdx>,
    spatial_idx: RTree<NodeEntry>,
}

impl fmt::Debug for RoadNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoadNetwork")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish_non_exhaustive()
    }
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new()
            .build()
            .unwrap_or_else(|_| unreachable!("an empty builder always validates"))
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn node_idx(&self, id: NodeId) -> Option<NodeIdx> {
        self.node_lookup.get(&id).copied()
    }

    #[inline]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_lookup.contains_key(&id)
    }

    #[inline]
    pub fn node_id(&self, idx: NodeIdx) -> NodeId {
        self.node_ids[idx.index()]
    }

    #[inline]
    pub fn pos(&self, idx: NodeIdx) -> GeoPoint {
        self.node_pos[idx.index()]
    }

    /// Index of the edge with identifier `key`, if present.
    pub fn edge_idx(&self, key: &EdgeKey) -> Option<EdgeIdx> {
        self.edge_key
            .binary_search(key)
            .ok()
            .map(|i| EdgeIdx(i as u32))
    }

    /// Iterator over all edge indices in edge-identifier order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        (0..self.edge_count()).map(|i| EdgeIdx(i as u32))
    }

    /// Fixed attributes of one edge.
    pub fn edge_attrs(&self, e: EdgeIdx) -> EdgeAttrs {
        let i = e.index();
        EdgeAttrs {
            length_m:     self.edge_length_m[i],
            free_flow_s:  self.edge_free_flow_s[i],
            capacity_vph: self.edge_capacity_vph[i],
            lanes:        self.edge_lanes[i],
            highway:      self.edge_highway[i],
        }
    }

    #[inline]
    pub fn edge_cost(&self, e: EdgeIdx, kind: CostKind) -> f64 {
        match kind {
            CostKind::Congested => self.edge_time_s[e.index()],
            CostKind::FreeFlow  => self.edge_free_flow_s[e.index()],
        }
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the outgoing edges of `node`, in edge-identifier order.
    ///
    /// A contiguous index range; no allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeIdx) -> impl Iterator<Item = EdgeIdx> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeIdx(i as u32))
    }

    /// Iterator over the incoming edges of `node`.
    #[inline]
    pub fn in_edges(&self, node: NodeIdx) -> impl Iterator<Item = EdgeIdx> + '_ {
        let start = self.node_in_start[node.index()] as usize;
        let end   = self.node_in_start[node.index() + 1] as usize;
        self.in_edge_list[start..end].iter().copied()
    }

    #[inline]
    pub fn out_degree(&self, node: NodeIdx) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Parallel edges `a → b`, in ascending `key` order.
    pub fn edges_between(&self, a: NodeIdx, b: NodeIdx) -> impl Iterator<Item = EdgeIdx> + '_ {
        self.out_edges(a).filter(move |e| self.edge_to[e.index()] == b)
    }

    /// `true` if at least one edge `a → b` exists.
    pub fn has_edge(&self, a: NodeIdx, b: NodeIdx) -> bool {
        self.edges_between(a, b).next().is_some()
    }

    /// `true` if `a` and `b` are adjacent in either direction.
    pub fn connected_either_way(&self, a: NodeIdx, b: NodeIdx) -> bool {
        self.has_edge(a, b) || self.has_edge(b, a)
    }

    /// The parallel edge `a → b` with the smallest cost of `kind`; ties go
    /// to the lowest edge identifier.
    pub fn best_parallel_edge(&self, a: NodeIdx, b: NodeIdx, kind: CostKind) -> Option<EdgeIdx> {
        let mut best: Option<(f64, EdgeIdx)> = None;
        for e in self.edges_between(a, b) {
            let c = self.edge_cost(e, kind);
            match best {
                Some((bc, _)) if c >= bc => {}
                _ => best = Some((c, e)),
            }
        }
        best.map(|(_, e)| e)
    }

    /// Nodes within `k` hops of `seed`, treating every edge as undirected
    /// (successors and predecessors both count).  Includes `seed`; sorted
    /// ascending.
    pub fn k_hop_neighbourhood(&self, seed: NodeIdx, k: usize) -> Vec<NodeIdx> {
        let mut seen = vec![false; self.node_count()];
        seen[seed.index()] = true;
        let mut frontier = vec![seed];
        let mut out = vec![seed];

        for _ in 0..k {
            let mut next = Vec::new();
            for &n in &frontier {
                let succ = self.out_edges(n).map(|e| self.edge_to[e.index()]);
                let pred = self.in_edges(n).map(|e| self.edge_from[e.index()]);
                for m in succ.chain(pred) {
                    if !seen[m.index()] {
                        seen[m.index()] = true;
                        next.push(m);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            out.extend_from_slice(&next);
            frontier = next;
        }

        out.sort_unstable();
        out
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nodes whose haversine distance to `center` is ≤ `radius_m`, sorted
    /// ascending.
    pub fn nodes_within_m(&self, center: GeoPoint, radius_m: f64) -> Vec<NodeIdx> {
        let half = center.bbox_half_deg(radius_m);
        let envelope = AABB::from_corners(
            [center.lat - half, center.lon - half],
            [center.lat + half, center.lon + half],
        );
        let mut out: Vec<NodeIdx> = self
            .spatial_idx
            .locate_in_envelope(&envelope)
            .filter(|entry| self.node_pos[entry.idx.index()].distance_m(center) <= radius_m)
            .map(|entry| entry.idx)
            .collect();
        out.sort_unstable();
        out
    }

    // ── Assignment state ──────────────────────────────────────────────────

    /// Zero all flows and set every time back to free-flow.
    pub fn reset_flows(&mut self) {
        self.edge_flow_vph.iter_mut().for_each(|f| *f = 0.0);
        self.edge_time_s.copy_from_slice(&self.edge_free_flow_s);
    }

    // ── Topology edits ────────────────────────────────────────────────────

    /// A builder holding this network's nodes and fixed edge attributes.
    /// Assignment state is not carried over.
    pub fn to_builder(&self) -> RoadNetworkBuilder {
        let mut b = RoadNetworkBuilder::with_capacity(self.node_count());
        for (i, (&id, &pos)) in self.node_ids.iter().zip(&self.node_pos).enumerate() {
            b.nodes.push((id, pos));
            b.node_slots.insert(id, i);
        }
        for e in self.edges() {
            b.edges.insert(self.edge_key[e.index()], self.edge_attrs(e));
        }
        b
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes and edges may be added in any order.  `build()` validates edge
/// endpoints and attributes, assigns dense indices, builds the CSR arrays
/// and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use ta_core::{GeoPoint, NodeId};
/// use ta_network::{EdgeAttrs, HighwayClass, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// b.add_node(NodeId(1), GeoPoint::new(18.03, -63.08)).unwrap();
/// b.add_node(NodeId(2), GeoPoint::new(18.04, -63.07)).unwrap();
/// let attrs = EdgeAttrs::from_speed(1_200.0, 40.0, 1.0, 900.0, HighwayClass::Tertiary);
/// b.add_road(NodeId(1), NodeId(2), attrs);
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:      Vec<(NodeId, GeoPoint)>,
    node_slots: FxHashMap<NodeId, usize>,
    edges:      BTreeMap<EdgeKey, EdgeAttrs>,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:      Vec::new(),
            node_slots: FxHashMap::default(),
            edges:      BTreeMap::new(),
        }
    }

    /// Pre-allocate for the expected number of nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes:      Vec::with_capacity(nodes),
            node_slots: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            edges:      BTreeMap::new(),
        }
    }

    /// Add a node.  Each `NodeId` may be added once.
    pub fn add_node(&mut self, id: NodeId, pos: GeoPoint) -> NetworkResult<()> {
        if self.node_slots.contains_key(&id) {
            return Err(NetworkError::DuplicateNode(id));
        }
        self.node_slots.insert(id, self.nodes.len());
        self.nodes.push((id, pos));
        Ok(())
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_slots.contains_key(&id)
    }

    /// Position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> Option<GeoPoint> {
        self.node_slots.get(&id).map(|&slot| self.nodes[slot].1)
    }

    /// Add a **directed** edge `from → to` under the next free parallel key
    /// for that node pair, and return its identifier.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) -> EdgeKey {
        let key = EdgeKey::new(from, to, self.next_key(from, to));
        self.edges.insert(key, attrs);
        key
    }

    /// Add a directed edge under an explicit identifier.
    pub fn insert_edge(&mut self, key: EdgeKey, attrs: EdgeAttrs) -> NetworkResult<()> {
        if self.edges.contains_key(&key) {
            return Err(NetworkError::DuplicateEdge(key));
        }
        self.edges.insert(key, attrs);
        Ok(())
    }

    /// Convenience: add edges in **both directions** for a two-way road.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, attrs: EdgeAttrs) -> (EdgeKey, EdgeKey) {
        (self.add_edge(a, b, attrs), self.add_edge(b, a, attrs))
    }

    /// Remove an edge; returns its attributes if it existed.
    pub fn remove_edge(&mut self, key: &EdgeKey) -> Option<EdgeAttrs> {
        self.edges.remove(key)
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    fn next_key(&self, from: NodeId, to: NodeId) -> u32 {
        let lo = EdgeKey::new(from, to, 0);
        let hi = EdgeKey::new(from, to, u32::MAX);
        self.edges
            .range((Bound::Included(lo), Bound::Included(hi)))
            .next_back()
            .map_or(0, |(k, _)| k.key + 1)
    }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// # Errors
    ///
    /// [`NetworkError::NodeNotFound`] for an edge endpoint that was never
    /// added; `InvalidCapacity` / `InvalidFreeFlowTime` / `InvalidLength` for
    /// attributes violating `capacity > 0`, `t0 > 0`, `length ≥ 0`.
    pub fn build(self) -> NetworkResult<RoadNetwork> {
        // ── Nodes: dense indices in ascending NodeId order ────────────────
        let mut nodes = self.nodes;
        nodes.sort_unstable_by_key(|(id, _)| *id);
        let node_count = nodes.len();

        let mut node_lookup: FxHashMap<NodeId, NodeIdx> =
            FxHashMap::with_capacity_and_hasher(node_count, Default::default());
        for (i, (id, _)) in nodes.iter().enumerate() {
            node_lookup.insert(*id, NodeIdx(i as u32));
        }

        // ── Edges: BTreeMap iteration is already EdgeKey order ────────────
        let edge_count = self.edges.len();
        let mut edge_key       = Vec::with_capacity(edge_count);
        let mut edge_from      = Vec::with_capacity(edge_count);
        let mut edge_to        = Vec::with_capacity(edge_count);
        let mut edge_length_m  = Vec::with_capacity(edge_count);
        let mut edge_free_flow = Vec::with_capacity(edge_count);
        let mut edge_capacity  = Vec::with_capacity(edge_count);
        let mut edge_lanes     = Vec::with_capacity(edge_count);
        let mut edge_highway   = Vec::with_capacity(edge_count);

        for (key, attrs) in self.edges {
            let from = *node_lookup.get(&key.from).ok_or(NetworkError::NodeNotFound(key.from))?;
            let to   = *node_lookup.get(&key.to).ok_or(NetworkError::NodeNotFound(key.to))?;
            validate_attrs(&key, &attrs)?;

            edge_key.push(key);
            edge_from.push(from);
            edge_to.push(to);
            edge_length_m.push(attrs.length_m);
            edge_free_flow.push(attrs.free_flow_s);
            edge_capacity.push(attrs.capacity_vph);
            edge_lanes.push(attrs.lanes);
            edge_highway.push(attrs.highway);
        }

        // ── CSR row pointers ──────────────────────────────────────────────
        let mut node_out_start = vec![0u32; node_count + 1];
        let mut node_in_start  = vec![0u32; node_count + 1];
        for (f, t) in edge_from.iter().zip(&edge_to) {
            node_out_start[f.index() + 1] += 1;
            node_in_start[t.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
            node_in_start[i]  += node_in_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Edges are visited in index order, so each node's incoming list is
        // in ascending EdgeIdx order.
        let mut in_edge_list = vec![EdgeIdx::INVALID; edge_count];
        let mut cursor: Vec<u32> = node_in_start[..node_count].to_vec();
        for (i, t) in edge_to.iter().enumerate() {
            let slot = &mut cursor[t.index()];
            in_edge_list[*slot as usize] = EdgeIdx(i as u32);
            *slot += 1;
        }

        // ── Spatial index ─────────────────────────────────────────────────
        let entries: Vec<NodeEntry> = nodes
            .iter()
            .enumerate()
            .map(|(i, (_, pos))| NodeEntry { point: [pos.lat, pos.lon], idx: NodeIdx(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        let (node_ids, node_pos): (Vec<NodeId>, Vec<GeoPoint>) = nodes.into_iter().unzip();

        Ok(RoadNetwork {
            node_ids,
            node_pos,
            node_out_start,
            node_in_start,
            in_edge_list,
            edge_key,
            edge_from,
            edge_to,
            edge_length_m,
            edge_flow_vph: vec![0.0; edge_count],
            edge_time_s: edge_free_flow.clone(),
            edge_free_flow_s: edge_free_flow,
            edge_capacity_vph: edge_capacity,
            edge_lanes,
            edge_highway,
            node_lookup,
            spatial_idx,
        })
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_attrs(key: &EdgeKey, attrs: &EdgeAttrs) -> NetworkResult<()> {
    if !(attrs.capacity_vph.is_finite() && attrs.capacity_vph > 0.0) {
        return Err(NetworkError::InvalidCapacity { edge: *key, capacity: attrs.capacity_vph });
    }
    if !(attrs.free_flow_s.is_finite() && attrs.free_flow_s > 0.0) {
        return Err(NetworkError::InvalidFreeFlowTime { edge: *key, free_flow_s: attrs.free_flow_s });
    }
    if !(attrs.length_m.is_finite() && attrs.length_m >= 0.0) {
        return Err(NetworkError::InvalidLength { edge: *key, length_m: attrs.length_m });
    }
    Ok(())
}
