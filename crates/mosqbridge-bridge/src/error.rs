//! Error types for the bridging layer.
//!
//! The broker only ever sees integer result codes; these errors feed the
//! tracing channel and the code translation in [`crate::dispatch`].

use thiserror::Error;

/// Error type for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A native buffer could not be decoded into a typed value.
    #[error("marshalling failed: {0}")]
    Marshal(String),

    /// A null pointer was supplied where text is mandatory.
    #[error("null buffer for mandatory `{0}`")]
    NullBuffer(&'static str),

    /// Unknown or already retired instance handle.
    ///
    /// This is a host/plugin protocol violation, not an expected runtime
    /// condition; callers log it as a defect.
    #[error("invalid instance handle {0}")]
    InvalidHandle(u64),

    /// Handler registration failed.
    #[error("handler registration failed: {0}")]
    Registration(String),

    /// The handler signalled an internal fault during a callback.
    #[error("handler fault: {0}")]
    HandlerFault(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::InvalidHandle(7);
        assert_eq!(err.to_string(), "invalid instance handle 7");

        let err = BridgeError::NullBuffer("username");
        assert_eq!(err.to_string(), "null buffer for mandatory `username`");

        let err = BridgeError::HandlerFault("state poisoned".into());
        assert_eq!(err.to_string(), "handler fault: state poisoned");
    }
}
