//! Connector specification and insertion.

use ta_core::{EdgeKey, NodeId};
use ta_network::attributes::free_flow_time_s;
use ta_network::{EdgeAttrs, HighwayClass, RoadNetwork};

use crate::{ScenarioError, ScenarioResult};

pub const DEFAULT_CONNECTOR_NAME: &str = "Proposed connector / bypass";

/// Per-lane capacity given to connectors when no configured value is
/// supplied, vehicles/hour.
pub const DEFAULT_CONNECTOR_CAPACITY_PER_LANE: f64 = 900.0;

/// A candidate new road between two existing nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectorSpec {
    pub a: NodeId,
    pub b: NodeId,
    pub length_m: f64,
    pub speed_kph: f64,
    pub lanes: f64,
    /// Only `a → b` is built when set.
    pub oneway: bool,
    pub name: String,
}

impl ConnectorSpec {
    /// Two-way, one lane, 40 kph.
    pub fn new(a: NodeId, b: NodeId, length_m: f64) -> Self {
        Self {
            a,
            b,
            length_m,
            speed_kph: 40.0,
            lanes: 1.0,
            oneway: false,
            name: DEFAULT_CONNECTOR_NAME.to_owned(),
        }
    }

    pub fn with_design(mut self, speed_kph: f64, lanes: f64) -> Self {
        self.speed_kph = speed_kph;
        self.lanes = lanes;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `length / max(1 m/s, speed)`, seconds.
    pub fn free_flow_s(&self) -> f64 {
        free_flow_time_s(self.length_m, self.speed_kph)
    }

    pub fn capacity_vph(&self, capacity_per_lane: f64) -> f64 {
        capacity_per_lane * self.lanes
    }

    pub fn edge_attrs(&self, capacity_per_lane: f64) -> EdgeAttrs {
        EdgeAttrs {
            length_m: self.length_m,
            free_flow_s: self.free_flow_s(),
            capacity_vph: self.capacity_vph(capacity_per_lane),
            lanes: self.lanes,
            highway: HighwayClass::ProposedConnector,
        }
    }

    pub fn undirected_pair(&self) -> (NodeId, NodeId) {
        ta_core::ids::undirected(self.a, self.b)
    }
}

/// A copy of `net` with the connector added.  Each new edge takes the next
/// free parallel key for its node pair.  Returns the new network and the
/// keys of the added edges.
///
/// `two_way == false` or `spec.oneway` builds only `a → b`.
pub fn apply_connector(
    net: &RoadNetwork,
    spec: &ConnectorSpec,
    two_way: bool,
    capacity_per_lane: f64,
) -> ScenarioResult<(RoadNetwork, Vec<EdgeKey>)> {
    for id in [spec.a, spec.b] {
        if !net.contains_node(id) {
            return Err(ScenarioError::NodeNotFound(id));
        }
    }

    let attrs = spec.edge_attrs(capacity_per_lane);
    let mut b = net.to_builder();
    let mut added = vec![b.add_edge(spec.a, spec.b, attrs)];
    if two_way && !spec.oneway {
        added.push(b.add_edge(spec.b, spec.a, attrs));
    }
    Ok((b.build()?, added))
}
