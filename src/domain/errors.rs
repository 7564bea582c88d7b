//! Domain errors for the Zyra loop reconciler.

use thiserror::Error;

/// Domain-level errors that can occur in the Zyra system.
///
/// Nothing here is fatal to the process. Failed polls keep the previous
/// snapshot, stuck states trigger a watchdog refresh, and only an approval
/// mutation failure reaches the merchant directly.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Backend request failed: {endpoint}: {reason}")]
    BackendRequestFailed { endpoint: String, reason: String },

    #[error("Backend returned status {status} for {endpoint}")]
    BackendStatus { endpoint: String, status: u16 },

    #[error("Activity stream disconnected: {0}")]
    StreamDisconnected(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid lifecycle transition from {from} to {to}: {reason}")]
    InvalidStateTransition { from: String, to: String, reason: String },

    #[error("Action approval rejected: {action_id}: {reason}")]
    ApprovalRejected { action_id: String, reason: String },

    #[error("Reconciler channel closed: {0}")]
    ChannelClosed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        DomainError::BackendRequestFailed {
            endpoint: err
                .url()
                .map_or_else(|| "<unknown>".to_string(), |u| u.path().to_string()),
            reason: err.to_string(),
        }
    }
}
