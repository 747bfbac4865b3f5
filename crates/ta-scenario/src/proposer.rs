//! Connector-candidate heuristics.
//!
//! Two strategies, both read-only over the network:
//!
//! - [`propose_connector_near_edge`]: structural.  Around a bottleneck
//!   `u → v`, find the nearby unconnected node pair whose free-flow detour
//!   is longest relative to its straight-line gap.
//! - [`shortest_path_relief_connectors`]: demand-driven.  For every trip
//!   whose congested path crosses the bottleneck, try short-cutting a few
//!   nodes before it to a few nodes after it, and rank the shortcuts by
//!   demand × time saved.

use std::collections::BTreeMap;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use ta_core::ids::undirected;
use ta_core::{EdgeKey, NodeId, NodeIdx, ProposerParams};
use ta_demand::OdPair;
use ta_network::attributes::free_flow_time_s;
use ta_network::{CostKind, DijkstraRouter, RoadNetwork, Router, ShortestPathTree};

use crate::connector::ConnectorSpec;
use crate::{ProposerError, ProposerResult};

// ── Near-edge proximity / detour ──────────────────────────────────────────────

/// Result of [`propose_connector_near_edge`].
#[derive(Clone, Debug, PartialEq)]
pub struct Proposal {
    pub spec: ConnectorSpec,
    /// Detour seconds per metre of straight-line gap; 0 for a fallback.
    pub score: f64,
    /// `true` when no candidate qualified and the connector joins `u` and `v`.
    pub fallback: bool,
    pub candidates_scored: usize,
}

/// Propose one connector near the bottleneck `u → v`.
///
/// Candidates pair a node `a` within `k_hops` of `u` with a node `b` within
/// `k_hops` of `v` such that `a != b`, no edge joins them in either
/// direction, and their haversine distance is at most `max_straight_m`.
/// Each scores `detour_s / max(min_straight_m, straight_m)` where
/// `detour_s` is the free-flow shortest time `a → b` (or
/// `disconnected_detour_s` when there is none).  The highest score wins;
/// ties keep the lowest `a`, then the lowest `b`.  Scoring stops after
/// `max_pairs` candidates.
///
/// # Errors
///
/// [`ProposerError::NodeNotFound`] if `u` or `v` is not in the network.
pub fn propose_connector_near_edge(
    net: &RoadNetwork,
    u: NodeId,
    v: NodeId,
    params: &ProposerParams,
) -> ProposerResult<Proposal> {
    let ui = net.node_idx(u).ok_or(ProposerError::NodeNotFound(u))?;
    let vi = net.node_idx(v).ok_or(ProposerError::NodeNotFound(v))?;

    let near_u = net.k_hop_neighbourhood(ui, params.k_hops);
    let mut in_near_v = vec![false; net.node_count()];
    for n in net.k_hop_neighbourhood(vi, params.k_hops) {
        in_near_v[n.index()] = true;
    }

    let mut scored = 0usize;
    // (score, a, b, straight_m)
    let mut best: Option<(f64, NodeIdx, NodeIdx, f64)> = None;

    'outer: for &a in &near_u {
        let a_pos = net.pos(a);
        let mut tree: Option<ShortestPathTree> = None;

        for b in net.nodes_within_m(a_pos, params.max_straight_m) {
            if a == b || !in_near_v[b.index()] || net.connected_either_way(a, b) {
                continue;
            }
            if scored >= params.max_pairs {
                break 'outer;
            }

            let straight = a_pos.distance_m(net.pos(b));
            let tree = tree.get_or_insert_with(|| DijkstraRouter.tree(net, a, CostKind::FreeFlow));
            let detour = tree.cost_to(b).unwrap_or(params.disconnected_detour_s);
            let score = detour / straight.max(params.min_straight_m);
            scored += 1;

            // Iteration is (a asc, b asc): strict improvement keeps the lowest pair on ties.
            if best.is_none_or(|(s, ..)| score > s) {
                best = Some((score, a, b, straight));
            }
        }
    }

    let proposal = match best {
        Some((score, a, b, straight)) => {
            let (a_id, b_id) = (net.node_id(a), net.node_id(b));
            Proposal {
                spec: ConnectorSpec::new(a_id, b_id, straight)
                    .with_design(params.speed_kph, params.lanes)
                    .with_name(format!("Connector near {u}->{v} ({a_id} <-> {b_id})")),
                score,
                fallback: false,
                candidates_scored: scored,
            }
        }
        None => {
            debug!("no connector candidate near {u}->{v}; falling back to the edge endpoints");
            let straight = net.pos(ui).distance_m(net.pos(vi));
            Proposal {
                spec: ConnectorSpec::new(u, v, straight)
                    .with_design(params.speed_kph, params.lanes)
                    .with_name(format!("Connector near {u}->{v} ({u} <-> {v})")),
                score: 0.0,
                fallback: true,
                candidates_scored: scored,
            }
        }
    };
    Ok(proposal)
}

// ── Demand-driven relief ──────────────────────────────────────────────────────

/// A relief connector and its aggregate benefit.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredConnector {
    pub spec: ConnectorSpec,
    /// Σ demand × seconds saved, vehicle-seconds/hour.
    pub score: f64,
    /// Σ demand of the trips that would use it, vehicles/hour.
    pub demand_vph: f64,
}

struct ReliefAgg {
    a: NodeId,
    b: NodeId,
    straight_m: f64,
    score: f64,
    demand_vph: f64,
}

/// Rank shortcut connectors for the trips crossing `bottleneck` on a solved
/// network.
///
/// For each OD whose congested shortest path contains the step
/// `bottleneck.from → bottleneck.to` at position `i`, candidate endpoints
/// are `a = path[i − back]` and `b = path[i + 1 + fwd]` for `back` in
/// `1..=relief_k_back`, `fwd` in `1..=relief_k_fwd`.  A candidate is kept
/// when `a != b`, the two are not already adjacent, and the straight-line
/// gap is at most `relief_max_straight_m`.  Its saving is the congested
/// time of the path segment `a..b` (cheapest parallel edge per step) minus
/// the connector's free-flow time; non-positive savings are dropped.
///
/// Scores aggregate per undirected pair (the first orientation seen is
/// kept).  Output is sorted by score descending, ties by pair ascending, and
/// truncated to `relief_top_k`.
pub fn shortest_path_relief_connectors(
    net: &RoadNetwork,
    od: &[OdPair],
    bottleneck: EdgeKey,
    label: &str,
    params: &ProposerParams,
) -> Vec<ScoredConnector> {
    let (Some(u), Some(v)) = (net.node_idx(bottleneck.from), net.node_idx(bottleneck.to)) else {
        warn!("relief search: bottleneck {bottleneck} not in network");
        return Vec::new();
    };

    let mut trees: FxHashMap<NodeIdx, ShortestPathTree> = FxHashMap::default();
    let mut agg: BTreeMap<(NodeId, NodeId), ReliefAgg> = BTreeMap::new();

    for pair in od {
        let (Some(o), Some(d)) = (net.node_idx(pair.origin), net.node_idx(pair.destination)) else {
            continue;
        };
        if o == d {
            continue;
        }
        let tree = trees
            .entry(o)
            .or_insert_with(|| DijkstraRouter.tree(net, o, CostKind::Congested));
        let Some(route) = tree.route_to(net, d) else {
            continue;
        };
        let path = route.nodes(net);

        for i in 0..path.len().saturating_sub(1) {
            if path[i] != u || path[i + 1] != v {
                continue;
            }
            for back in 1..=params.relief_k_back {
                let Some(ia) = i.checked_sub(back) else { break };
                for fwd in 1..=params.relief_k_fwd {
                    let ib = i + 1 + fwd;
                    if ib >= path.len() {
                        break;
                    }
                    let (a, b) = (path[ia], path[ib]);
                    if a == b || net.connected_either_way(a, b) {
                        continue;
                    }
                    let straight = net.pos(a).distance_m(net.pos(b));
                    if straight > params.relief_max_straight_m {
                        continue;
                    }
                    let Some(current) = segment_time(net, &path[ia..=ib]) else {
                        continue;
                    };
                    let saved = current - free_flow_time_s(straight, params.speed_kph);
                    if saved <= 0.0 {
                        continue;
                    }

                    let (a_id, b_id) = (net.node_id(a), net.node_id(b));
                    let entry = agg.entry(undirected(a_id, b_id)).or_insert(ReliefAgg {
                        a: a_id,
                        b: b_id,
                        straight_m: straight,
                        score: 0.0,
                        demand_vph: 0.0,
                    });
                    entry.score += pair.demand_vph * saved;
                    entry.demand_vph += pair.demand_vph;
                }
            }
        }
    }

    // BTreeMap iteration is already pair-ascending; a stable sort keeps it
    // as the tie-break.
    let mut out: Vec<ScoredConnector> = agg
        .into_values()
        .map(|r| ScoredConnector {
            spec: ConnectorSpec::new(r.a, r.b, r.straight_m)
                .with_design(params.speed_kph, params.lanes)
                .with_name(format!("Relief connector near {label} ({} <-> {})", r.a, r.b)),
            score: r.score,
            demand_vph: r.demand_vph,
        })
        .collect();
    out.sort_by(|x, y| y.score.total_cmp(&x.score));
    out.truncate(params.relief_top_k);
    out
}

/// Congested time along consecutive path nodes, cheapest parallel edge per
/// step.
fn segment_time(net: &RoadNetwork, nodes: &[NodeIdx]) -> Option<f64> {
    nodes.windows(2).try_fold(0.0, |acc, w| {
        net.best_parallel_edge(w[0], w[1], CostKind::Congested)
            .map(|e| acc + net.edge_time_s[e.index()])
    })
}
