use thiserror::Error;

use ta_core::TaError;

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("iteration count must be >= 0, got {0}")]
    NegativeIterations(i64),

    #[error("invalid assignment parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Core(#[from] TaError),
}

pub type AssignResult<T> = Result<T, AssignError>;
