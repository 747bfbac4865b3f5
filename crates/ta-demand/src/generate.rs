//! Weighted OD generation.
//!
//! Trip ends are drawn in proportion to a node weight that grows with the
//! class of the roads touching the node, so arterial junctions attract more
//! trips than cul-de-sacs:
//!
//! ```text
//! weight(n) = 1 + Σ importance(highway(e))   over e incoming to or outgoing from n
//! ```
//!
//! Each pair gets a uniform raw demand in `(0, 1]`, and the whole list is
//! rescaled so its demands sum to the requested total.

use log::debug;
use rand::distributions::WeightedIndex;

use ta_core::{DemandConfig, SimRng};
use ta_network::RoadNetwork;

use crate::{DemandError, DemandResult, OdPair};

/// Keeps every raw draw strictly positive.
const RAW_DEMAND_FLOOR: f64 = 1e-6;

/// Node weights indexed by `NodeIdx`.
pub fn node_weights(net: &RoadNetwork) -> Vec<f64> {
    let mut w = vec![1.0; net.node_count()];
    for e in net.edges() {
        let imp = net.edge_highway[e.index()].importance();
        w[net.edge_from[e.index()].index()] += imp;
        w[net.edge_to[e.index()].index()] += imp;
    }
    w
}

/// Draw `n_pairs` weighted OD pairs whose demands sum to `total_vph`.
///
/// Origins and destinations are sampled independently from
/// [`node_weights`]; a destination equal to its origin is redrawn.  The same
/// RNG state always yields the same list.
///
/// # Errors
///
/// - [`DemandError::InvalidTotal`] if `total_vph` is negative or non-finite.
/// - [`DemandError::TooFewNodes`] if `n_pairs > 0` and the network has
///   fewer than two nodes.
pub fn generate_od_weighted_total(
    net: &RoadNetwork,
    n_pairs: usize,
    total_vph: f64,
    rng: &mut SimRng,
) -> DemandResult<Vec<OdPair>> {
    if !total_vph.is_finite() || total_vph < 0.0 {
        return Err(DemandError::InvalidTotal(total_vph));
    }
    if n_pairs == 0 {
        return Ok(Vec::new());
    }
    if net.node_count() < 2 {
        return Err(DemandError::TooFewNodes(net.node_count()));
    }

    let weights = node_weights(net);
    let dist = WeightedIndex::new(&weights).map_err(|e| DemandError::Weights(e.to_string()))?;

    let mut pairs: Vec<OdPair> = Vec::with_capacity(n_pairs);
    let mut raw_sum = 0.0;
    for _ in 0..n_pairs {
        let o = rng.sample_index(&dist);
        let mut d = rng.sample_index(&dist);
        while d == o {
            d = rng.sample_index(&dist);
        }
        let raw = rng.unit_f64() + RAW_DEMAND_FLOOR;
        raw_sum += raw;
        pairs.push(OdPair::new(net.node_ids[o], net.node_ids[d], raw));
    }

    let scale = total_vph / raw_sum;
    for p in &mut pairs {
        p.demand_vph *= scale;
    }

    debug!("generated {n_pairs} OD pairs totalling {total_vph:.1} vph");
    Ok(pairs)
}

/// [`generate_od_weighted_total`] driven by a [`DemandConfig`], seeded from
/// `cfg.seed`.
pub fn generate_from_config(net: &RoadNetwork, cfg: &DemandConfig) -> DemandResult<Vec<OdPair>> {
    let mut rng = SimRng::new(cfg.seed);
    generate_od_weighted_total(net, cfg.n_pairs, cfg.total_demand_vph, &mut rng)
}
