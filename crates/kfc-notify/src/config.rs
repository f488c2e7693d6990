//! SMTP delivery configuration and credentials.
//!
//! Both are plain values passed to [`crate::NotificationSender`] and
//! [`crate::AuthNegotiator`] at construction time.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};

/// Default envelope sender.
pub const DEFAULT_SENDER: &str = "kfc@example.org";

/// Default name announced in EHLO/HELO.
pub const DEFAULT_HELLO_NAME: &str = "localhost";

/// Default deadline for a single notification attempt, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the SASL username.
pub const ENV_USERNAME: &str = "SMTP_AUTH_USERNAME";
/// Environment variable holding the CRAM-MD5 shared secret.
pub const ENV_SECRET: &str = "SMTP_AUTH_SECRET";
/// Environment variable holding the PLAIN password.
pub const ENV_PASSWORD: &str = "SMTP_AUTH_PASSWORD";
/// Environment variable holding the optional PLAIN authorization identity.
pub const ENV_IDENTITY: &str = "SMTP_AUTH_IDENTITY";

/// How transport security is established with the smart host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Connect in plaintext and upgrade with STARTTLS when auth requires it.
    #[default]
    StartTls,
    /// Wrap the connection in TLS before the greeting (port 465 style).
    Implicit,
}

/// Configuration for delivering notifications through a smart host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Address of the smart host, as `host:port`.
    pub smart_host: String,
    /// Envelope sender and `From` address.
    pub sender: String,
    /// Name announced in EHLO/HELO.
    pub hello_name: String,
    /// Transport security mode.
    pub tls_mode: TlsMode,
    /// Deadline for a whole notification attempt, in seconds.
    pub timeout_secs: u64,
}

impl SmtpConfig {
    /// Creates a configuration for the given smart host and sender.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidConfig` if the smart host is empty or the
    /// sender is not a single-line address.
    pub fn new(smart_host: impl Into<String>, sender: impl Into<String>) -> Result<Self> {
        let config = Self {
            smart_host: smart_host.into(),
            sender: sender.into(),
            hello_name: DEFAULT_HELLO_NAME.to_string(),
            tls_mode: TlsMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the EHLO/HELO name.
    #[must_use]
    pub fn with_hello_name(mut self, name: impl Into<String>) -> Self {
        self.hello_name = name.into();
        self
    }

    /// Sets the TLS mode.
    #[must_use]
    pub const fn with_tls_mode(mut self, mode: TlsMode) -> Self {
        self.tls_mode = mode;
        self
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Returns the per-attempt deadline as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks that the configuration can be used for delivery.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.smart_host.is_empty() {
            return Err(NotifyError::InvalidConfig {
                reason: "smart host cannot be empty".to_string(),
            });
        }
        if self.sender.is_empty() || has_line_break(&self.sender) {
            return Err(NotifyError::InvalidConfig {
                reason: format!("invalid sender address {:?}", self.sender),
            });
        }
        if self.hello_name.is_empty() || has_line_break(&self.hello_name) {
            return Err(NotifyError::InvalidConfig {
                reason: format!("invalid hello name {:?}", self.hello_name),
            });
        }
        if self.timeout_secs == 0 {
            return Err(NotifyError::InvalidConfig {
                reason: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

/// SASL credentials used when the smart host advertises AUTH.
///
/// Empty strings are treated as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Username for CRAM-MD5 and PLAIN.
    pub username: String,
    /// Shared secret enabling CRAM-MD5.
    pub secret: Option<String>,
    /// Password enabling PLAIN.
    pub password: Option<String>,
    /// Authorization identity for PLAIN.
    pub identity: String,
}

impl Credentials {
    /// Creates credentials for the given username with no secrets.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Sets the CRAM-MD5 shared secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = non_empty(secret.into());
        self
    }

    /// Sets the PLAIN password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = non_empty(password.into());
        self
    }

    /// Sets the PLAIN authorization identity.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Reads credentials from the `SMTP_AUTH_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        Self {
            username: lookup(ENV_USERNAME).unwrap_or_default(),
            secret: lookup(ENV_SECRET).and_then(non_empty),
            password: lookup(ENV_PASSWORD).and_then(non_empty),
            identity: lookup(ENV_IDENTITY).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("identity", &self.identity)
            .finish()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
