//! # Domain Errors
//!
//! Error types for progress sync.
//!
//! Only `AuthFailure`, `RegistrationFailure`, `InvalidGain` and `StorageWrite`
//! ever reach a caller; `AuthUnavailable` is reported as `AuthFailure`. Feed and notification failures are logged and
//! swallowed inside the application layer.

use thiserror::Error;

/// Progress sync error types.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Credentials rejected by the auth service and unknown to the directory.
    #[error("Invalid credentials")]
    AuthFailure,

    /// The auth service could not be reached.
    #[error("Auth service unavailable: {0}")]
    AuthUnavailable(String),

    /// Registration rejected, with the server-provided reason.
    #[error("Registration failed: {0}")]
    RegistrationFailure(String),

    /// A completion feed could not be fetched or decoded.
    #[error("Feed fetch failed: {0}")]
    FeedFetch(String),

    /// A push to the remote progress service failed.
    #[error("Remote notification failed: {0}")]
    RemoteNotify(String),

    /// Negative XP amount. There is no concept of XP loss.
    #[error("Invalid XP gain: {0} (must be >= 0)")]
    InvalidGain(i64),

    /// Durable storage write failed; in-memory state was kept.
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// Durable storage read failed.
    #[error("Storage read failed: {0}")]
    StorageRead(String),

    /// Snapshot (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_gain_error() {
        let err = ProgressError::InvalidGain(-5);
        assert!(err.to_string().contains("-5"));
    }

    #[test]
    fn test_registration_failure_keeps_reason() {
        let err = ProgressError::RegistrationFailure("email already in use".to_string());
        assert!(err.to_string().contains("email already in use"));
    }

    #[test]
    fn test_serialization_from() {
        let err: ProgressError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ProgressError::Serialization(_)));
    }
}
