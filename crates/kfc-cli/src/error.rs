//! CLI error types.

use std::fmt;

use kfc_alerts::AlertError;
use kfc_notify::NotifyError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// The alert could not be built from the arguments.
    Alert(AlertError),
    /// Rendering or delivery failed.
    Notify(NotifyError),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Alert(e) => write!(f, "alert error: {e}"),
            Self::Notify(e) => write!(f, "notification failed: {e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alert(e) => Some(e),
            Self::Notify(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<AlertError> for CliError {
    fn from(err: AlertError) -> Self {
        Self::Alert(err)
    }
}

impl From<NotifyError> for CliError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::InvalidConfig { reason } => Self::Config(reason),
            other => Self::Notify(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_config() {
        let err = CliError::Config("smart host cannot be empty".into());
        assert_eq!(err.to_string(), "configuration error: smart host cannot be empty");
    }

    #[test]
    fn cli_error_display_notify() {
        let err = CliError::from(NotifyError::StartTls {
            reason: "454 TLS not available".into(),
        });
        assert_eq!(
            err.to_string(),
            "notification failed: starttls failed: 454 TLS not available"
        );
    }

    #[test]
    fn invalid_config_maps_to_config_error() {
        let err = CliError::from(NotifyError::InvalidConfig {
            reason: "bad".into(),
        });
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
