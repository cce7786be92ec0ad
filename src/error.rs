//! Application error taxonomy.

use jira_api::JiraError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Required settings are missing or malformed. Raised before any remote call.
    #[error("{0}")]
    Configuration(String),
    #[error("tracker error: {0}")]
    Tracker(#[from] JiraError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl AppError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::Configuration(_) | AppError::Tracker(JiraError::Configuration(_))
        )
    }
}
