//! Error types for the kfc-alerts crate.

use thiserror::Error;

/// Errors that can occur when building or decoding alerts.
#[derive(Debug, Error)]
pub enum AlertError {
    /// A label was not given as `name=value`.
    #[error("invalid label {pair:?}: expected name=value")]
    InvalidLabel {
        /// The offending input.
        pair: String,
    },

    /// A fingerprint string was not 1 to 16 hex digits.
    #[error("invalid fingerprint: {value:?}")]
    InvalidFingerprint {
        /// The offending input.
        value: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_label() {
        let err = AlertError::InvalidLabel {
            pair: "novalue".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid label \"novalue\": expected name=value"
        );
    }

    #[test]
    fn error_display_invalid_fingerprint() {
        let err = AlertError::InvalidFingerprint {
            value: "xyz".to_string(),
        };
        assert_eq!(err.to_string(), "invalid fingerprint: \"xyz\"");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("invalid json");
        assert!(json_err.is_err());
        let alert_err: AlertError = json_err.unwrap_err().into();
        assert!(matches!(alert_err, AlertError::SerializationError(_)));
    }
}
