//! OD pair type and whole-matrix operations.

use serde::{Deserialize, Serialize};

use ta_core::NodeId;

use crate::{DemandError, DemandResult};

/// One origin-destination demand, vehicles/hour.
///
/// Generated pairs always have `origin != destination`; assignment tolerates
/// equal endpoints (the trip contributes no flow).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OdPair {
    pub origin:      NodeId,
    pub destination: NodeId,
    pub demand_vph:  f64,
}

impl OdPair {
    pub fn new(origin: NodeId, destination: NodeId, demand_vph: f64) -> Self {
        Self { origin, destination, demand_vph }
    }

    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.origin == self.destination
    }
}

/// Sum of all demands.
pub fn total_demand(od: &[OdPair]) -> f64 {
    od.iter().map(|p| p.demand_vph).sum()
}

/// Multiply every demand by `factor`, keeping pairs and their order.
pub fn scale_od(od: &[OdPair], factor: f64) -> DemandResult<Vec<OdPair>> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(DemandError::InvalidScale(factor));
    }
    Ok(od
        .iter()
        .map(|p| OdPair { demand_vph: p.demand_vph * factor, ..*p })
        .collect())
}
