use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemandError {
    #[error("total demand must be finite and >= 0, got {0}")]
    InvalidTotal(f64),

    #[error("demand scale factor must be finite and >= 0, got {0}")]
    InvalidScale(f64),

    #[error("need at least 2 nodes to draw OD pairs, network has {0}")]
    TooFewNodes(usize),

    #[error("invalid node weights: {0}")]
    Weights(String),

    #[error("OD parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DemandResult<T> = Result<T, DemandError>;
