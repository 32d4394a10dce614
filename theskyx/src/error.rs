//! Error types for the TheSkyX protocol client.

use thiserror::Error;

/// Errors surfaced by [`TheSkyXClient`](crate::TheSkyXClient) operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TheSkyXError {
    /// Name resolution failed or the connection was refused.
    #[error("Cannot reach server at {address}: {cause}")]
    ConnectionFailed { address: String, cause: String },

    /// I/O failure after the connection was established.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server closed the exchange without a reply line.
    #[error("Empty reply from server")]
    EmptyReply,

    /// The camera reported a non-zero status for a command. The payload is
    /// the detail text preceding the `|` separator in the reply.
    #[error("Error {0} from camera")]
    Camera(String),

    /// Temperature reply was unparsable or outside the plausible range.
    #[error("Invalid temperature returned: {0:?}")]
    InvalidTemperature(String),

    /// A reply that should carry a numeric value could not be parsed.
    #[error("Malformed reply: {0:?}")]
    MalformedReply(String),
}

impl TheSkyXError {
    /// True for failures of the transport itself rather than of the camera.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TheSkyXError::ConnectionFailed { .. }
                | TheSkyXError::Transport(_)
                | TheSkyXError::EmptyReply
        )
    }
}

/// Result type for TheSkyX operations
pub type TheSkyXResult<T> = Result<T, TheSkyXError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TheSkyXError::ConnectionFailed {
            address: "localhost:3040".to_string(),
            cause: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot reach server at localhost:3040: connection refused"
        );

        let err = TheSkyXError::Camera("5".to_string());
        assert_eq!(err.to_string(), "Error 5 from camera");

        let err = TheSkyXError::InvalidTemperature("banana".to_string());
        assert!(err.to_string().contains("banana"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(TheSkyXError::EmptyReply.is_transport());
        assert!(TheSkyXError::Transport("broken pipe".into()).is_transport());
        assert!(!TheSkyXError::Camera("5".into()).is_transport());
        assert!(!TheSkyXError::InvalidTemperature("x".into()).is_transport());
    }
}
