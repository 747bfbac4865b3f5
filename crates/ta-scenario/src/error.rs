use thiserror::Error;

use ta_assign::AssignError;
use ta_core::NodeId;
use ta_demand::DemandError;
use ta_network::NetworkError;

/// Errors from the connector-proposal heuristics.
#[derive(Debug, Error)]
pub enum ProposerError {
    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),
}

pub type ProposerResult<T> = Result<T, ProposerError>;

/// Errors from applying or evaluating a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("connector endpoint {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("invalid scenario: {0}")]
    Invalid(String),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("demand error: {0}")]
    Demand(#[from] DemandError),

    #[error("assignment error: {0}")]
    Assign(#[from] AssignError),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
