//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for TerraSync
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    /// Connectivity probing exhausted all attempts. Fatal to the whole run.
    #[error("network unavailable after {attempts} probe attempts")]
    NetworkUnavailable { attempts: u32 },

    /// Credentials rejected by the remote endpoint. Fatal, never retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// I/O or protocol failure during a single transfer operation.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Remote directory listing failed (for example, the path does not exist).
    #[error("remote listing failed: {0}")]
    RemoteList(String),

    /// A record field violates the flat-file contract. Never retried.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A decoded row does not match the header it was parsed against.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl SyncError {
    /// Whether a retry of the failed operation could plausibly succeed.
    ///
    /// Transfer and listing failures are transient network conditions.
    /// Authentication and local data-contract violations reproduce the
    /// same outcome on every attempt and must surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transfer(_) | SyncError::RemoteList(_) | SyncError::Io(_)
        )
    }

    /// Whether this failure aborts the whole orchestration run rather
    /// than a single step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::NetworkUnavailable { .. } | SyncError::Auth(_))
    }
}

impl terrasync_common::RetryClass for SyncError {
    fn is_retryable(&self) -> bool {
        SyncError::is_retryable(self)
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

/// Result type alias for TerraSync operations
pub type Result<T> = std::result::Result<T, SyncError>;
