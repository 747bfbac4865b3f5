//! Network-subsystem error type.

use thiserror::Error;

use ta_core::{EdgeKey, NodeId};

/// Errors produced by `ta-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("node {0} added twice")]
    DuplicateNode(NodeId),

    #[error("edge {0} added twice")]
    DuplicateEdge(EdgeKey),

    #[error("edge {edge}: capacity must be > 0, got {capacity}")]
    InvalidCapacity { edge: EdgeKey, capacity: f64 },

    #[error("edge {edge}: free-flow time must be > 0, got {free_flow_s}")]
    InvalidFreeFlowTime { edge: EdgeKey, free_flow_s: f64 },

    #[error("edge {edge}: length must be >= 0, got {length_m}")]
    InvalidLength { edge: EdgeKey, length_m: f64 },

    #[error("network input parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
