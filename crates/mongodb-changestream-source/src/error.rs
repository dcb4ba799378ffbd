use serde_json::Value;
use sync_core::OperationType;
use thiserror::Error;

/// Failure of the change-application engine.
///
/// Expected duplicate-key races never surface here; they are counted in
/// [`SyncOutcome::conflicts`](crate::SyncOutcome::conflicts) instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CrateDB rejected {operation} of {id:?}: {message}")]
    Write {
        operation: OperationType,
        id: Option<Value>,
        message: String,
        code: Option<i64>,
    },

    #[error("CrateDB answered a {operation} with an unexpected {received} response")]
    UnexpectedResponse {
        operation: OperationType,
        received: &'static str,
    },

    #[error("CrateDB request failed: {0:#}")]
    Transport(anyhow::Error),
}
