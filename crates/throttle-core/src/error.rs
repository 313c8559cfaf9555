//! Throttle error types.

use thiserror::Error;

use crate::ports::StoreError;

/// Errors surfaced by [`crate::RateLimiter`].
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// The window's maximum has been exceeded for this identifier.
    #[error("Too many requests for operation: {identifier}")]
    LimitExceeded { identifier: String },

    /// The counter store failed; passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ThrottleError {
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, ThrottleError::LimitExceeded { .. })
    }
}

/// Result type alias for throttle operations.
pub type Result<T> = std::result::Result<T, ThrottleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_exceeded_message_carries_identifier() {
        let err = ThrottleError::LimitExceeded {
            identifier: "feed:203.0.113.5".to_string(),
        };
        assert!(err.is_limit_exceeded());
        assert_eq!(
            err.to_string(),
            "Too many requests for operation: feed:203.0.113.5"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: ThrottleError = StoreError::Connection("refused".to_string()).into();
        assert!(!err.is_limit_exceeded());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }
}
