use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("advisory provider not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AdvisoryError {
    /// The provider refused the call because the account is out of credit.
    pub fn is_insufficient_balance(&self) -> bool {
        match self {
            AdvisoryError::Http { status, body } => {
                *status == 402 || body.contains("Insufficient Balance")
            }
            AdvisoryError::InvalidResponse(msg) => msg.contains("Insufficient Balance"),
            _ => false,
        }
    }
}

pub type AdvisoryResult<T> = Result<T, AdvisoryError>;
