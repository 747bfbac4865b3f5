//! What-if mutations.
//!
//! A scenario never touches its input: [`Scenario::apply`] returns a fresh
//! network and [`Scenario::apply_demand`] a fresh OD list.

use log::warn;

use ta_core::EdgeKey;
use ta_demand::{scale_od, OdPair};
use ta_network::RoadNetwork;

use crate::connector::{apply_connector, ConnectorSpec, DEFAULT_CONNECTOR_CAPACITY_PER_LANE};
use crate::{ScenarioError, ScenarioResult};

#[derive(Clone, Debug, PartialEq)]
pub enum Scenario {
    /// Multiply one edge's capacity by `1 + pct`.
    IncreaseCapacity { edge: EdgeKey, pct: f64 },
    /// Remove one edge.
    Closure { edge: EdgeKey },
    /// Build a new connector.
    AddConnector { spec: ConnectorSpec, two_way: bool },
    /// Multiply every OD demand by `factor`.  Network unchanged.
    ScaleDemand { factor: f64 },
}

impl Scenario {
    /// Stable machine-readable kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            Scenario::IncreaseCapacity { .. } => "capacity_increase",
            Scenario::Closure { .. }          => "closure",
            Scenario::AddConnector { .. }     => "add_connector",
            Scenario::ScaleDemand { .. }      => "demand_scale",
        }
    }

    pub fn name(&self) -> String {
        match self {
            Scenario::IncreaseCapacity { edge, pct } => {
                format!("Capacity +{:.0}% on {edge}", pct * 100.0)
            }
            Scenario::Closure { edge } => format!("Close {edge}"),
            Scenario::AddConnector { spec, .. } => spec.name.clone(),
            Scenario::ScaleDemand { factor } => format!("Demand x{factor:.2}"),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Scenario::IncreaseCapacity { edge, pct } => format!(
                "Increase capacity of edge {edge} by {:.1}% (e.g. added lane or signal retiming)",
                pct * 100.0
            ),
            Scenario::Closure { edge } => format!("Close edge {edge} to all traffic"),
            Scenario::AddConnector { spec, two_way } => format!(
                "Add {} connector {} <-> {}: {:.0} m, {:.0} kph, {} lane(s)",
                if *two_way && !spec.oneway { "two-way" } else { "one-way" },
                spec.a,
                spec.b,
                spec.length_m,
                spec.speed_kph,
                spec.lanes,
            ),
            Scenario::ScaleDemand { factor } => {
                format!("Scale all OD demand by {factor:.3}")
            }
        }
    }

    /// [`apply_with`](Self::apply_with) using the default connector
    /// capacity per lane.
    pub fn apply(&self, net: &RoadNetwork) -> ScenarioResult<RoadNetwork> {
        self.apply_with(net, DEFAULT_CONNECTOR_CAPACITY_PER_LANE)
    }

    /// The mutated copy of `net`.
    ///
    /// A capacity or closure target missing from the network yields an
    /// unchanged copy and a warning.  A connector endpoint missing from the
    /// network is an error.
    pub fn apply_with(&self, net: &RoadNetwork, connector_capacity_per_lane: f64) -> ScenarioResult<RoadNetwork> {
        match self {
            Scenario::IncreaseCapacity { edge, pct } => {
                if !pct.is_finite() || *pct <= -1.0 {
                    return Err(ScenarioError::Invalid(format!(
                        "capacity change must be > -100%, got {pct}"
                    )));
                }
                let mut out = net.clone();
                match out.edge_idx(edge) {
                    Some(e) => out.edge_capacity_vph[e.index()] *= 1.0 + pct,
                    None => warn!("capacity scenario: edge {edge} not in network, unchanged"),
                }
                Ok(out)
            }
            Scenario::Closure { edge } => {
                let mut b = net.to_builder();
                if b.remove_edge(edge).is_none() {
                    warn!("closure scenario: edge {edge} not in network, unchanged");
                    return Ok(net.clone());
                }
                Ok(b.build()?)
            }
            Scenario::AddConnector { spec, two_way } => {
                let (out, _) = apply_connector(net, spec, *two_way, connector_capacity_per_lane)?;
                Ok(out)
            }
            Scenario::ScaleDemand { .. } => Ok(net.clone()),
        }
    }

    /// The OD list this scenario is evaluated with.
    pub fn apply_demand(&self, od: &[OdPair]) -> ScenarioResult<Vec<OdPair>> {
        match self {
            Scenario::ScaleDemand { factor } => Ok(scale_od(od, *factor)?),
            _ => Ok(od.to_vec()),
        }
    }
}
