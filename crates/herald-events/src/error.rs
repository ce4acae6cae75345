//! Emitter error types.

use thiserror::Error;

/// Errors raised by the emitter itself.
///
/// Listener failures are not represented here: `emit` hands back whatever
/// error the listener returned, untouched.
#[derive(Debug, Error)]
pub enum EmitterError {
    /// A registration was given something that is not a listener.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the value was rejected.
        reason: String,
    },

    /// A typed listener received a payload of another type.
    #[error("payload for event {key} is not a {expected}")]
    PayloadMismatch {
        /// Event key the payload was emitted under.
        key: String,
        /// Payload type the listener was registered for.
        expected: &'static str,
    },
}

/// Result type for emitter operations.
pub type EmitterResult<T> = Result<T, EmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EmitterError::InvalidArgument {
            reason: "listener must be invocable".to_string(),
        };
        assert_eq!(err.to_string(), "invalid argument: listener must be invocable");

        let err = EmitterError::PayloadMismatch {
            key: "data".to_string(),
            expected: "alloc::string::String",
        };
        assert_eq!(
            err.to_string(),
            "payload for event data is not a alloc::string::String"
        );
    }
}
