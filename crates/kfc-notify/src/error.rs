//! Error types for the kfc-notify crate.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthMechanism;
use crate::smtp::Reply;

/// Errors that can occur while delivering a notification.
///
/// Nothing here is retried; every variant ends the current attempt.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The smart host could not be reached.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// The address that was dialled.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },

    /// A configured or supplied address is malformed.
    #[error("invalid address: {reason}")]
    InvalidAddress {
        /// Why the address was rejected.
        reason: String,
    },

    /// The STARTTLS upgrade failed.
    #[error("starttls failed: {reason}")]
    StartTls {
        /// The server reply or TLS error.
        reason: String,
    },

    /// SASL authentication failed.
    #[error("{mechanism} failed: {reason}")]
    Auth {
        /// The mechanism that was attempted.
        mechanism: AuthMechanism,
        /// The server reply or local refusal.
        reason: String,
    },

    /// The server answered a command with an unexpected reply.
    #[error("{command} rejected: {reply}")]
    Reply {
        /// The command verb that was rejected.
        command: &'static str,
        /// The reply that was received.
        reply: Reply,
    },

    /// The server sent something that is not a valid SMTP reply.
    #[error("protocol error: {reason}")]
    Protocol {
        /// What was wrong with the reply.
        reason: String,
    },

    /// Writing the rendered message failed.
    #[error("render failed: {0}")]
    Render(#[source] io::Error),

    /// Network I/O failed mid-session.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The attempt did not finish within its deadline.
    #[error("notification attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
