use thiserror::Error;

/// Errors raised while fetching, querying or predicting over the stop log.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The backing store could not be reached or read.
    #[error("data store unavailable: {0}")]
    DataStoreUnavailable(String),

    #[error("unknown query: {0}")]
    InvalidQuery(String),

    /// A new-stop form was missing a field or violated a constraint.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        DashboardError::DataStoreUnavailable(reason.to_string())
    }

    pub fn invalid_submission(reason: impl Into<String>) -> Self {
        DashboardError::InvalidSubmission(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
