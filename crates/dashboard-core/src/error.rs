use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Computation failure: {0}")]
    ComputationFailure(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
