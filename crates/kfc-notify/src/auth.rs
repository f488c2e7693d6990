//! SMTP authentication negotiation.
//!
//! [`AuthNegotiator`] looks at the mechanisms the smart host advertises in
//! its AUTH extension and at the available [`Credentials`], and decides how
//! (and whether) to authenticate. PLAIN sends the password in the clear, so
//! selecting it also yields a [`TlsConfig`] pinned to the smart host's name
//! for the STARTTLS upgrade.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use md5::Md5;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Credentials;
use crate::error::{NotifyError, Result};

type HmacMd5 = Hmac<Md5>;

/// SASL mechanisms this crate can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMechanism {
    /// RFC 2195 challenge-response with a shared secret.
    #[serde(rename = "CRAM-MD5")]
    CramMd5,
    /// RFC 4616 username/password.
    #[serde(rename = "PLAIN")]
    Plain,
}

impl AuthMechanism {
    /// Returns the mechanism name as advertised by servers.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CramMd5 => "CRAM-MD5",
            Self::Plain => "PLAIN",
        }
    }

    /// Maps an advertised mechanism name to a supported mechanism.
    #[must_use]
    pub fn from_advertised(name: &str) -> Option<Self> {
        match name {
            "CRAM-MD5" => Some(Self::CramMd5),
            "PLAIN" => Some(Self::Plain),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authentication handle ready to be run against the server.
#[derive(Clone, PartialEq, Eq)]
pub enum SmtpAuth {
    /// CRAM-MD5 with a shared secret.
    CramMd5 {
        /// Username sent with the digest.
        username: String,
        /// Shared secret keying the HMAC.
        secret: String,
    },
    /// PLAIN with an optional authorization identity.
    Plain {
        /// Authorization identity, may be empty.
        identity: String,
        /// Authentication identity.
        username: String,
        /// Password.
        password: String,
        /// Host the credentials are meant for.
        host: String,
    },
}

impl SmtpAuth {
    /// Returns the mechanism of this handle.
    #[must_use]
    pub const fn mechanism(&self) -> AuthMechanism {
        match self {
            Self::CramMd5 { .. } => AuthMechanism::CramMd5,
            Self::Plain { .. } => AuthMechanism::Plain,
        }
    }

    /// Returns the base64 initial response sent with `AUTH`, if any.
    #[must_use]
    pub fn initial_response(&self) -> Option<String> {
        match self {
            Self::CramMd5 { .. } => None,
            Self::Plain {
                identity,
                username,
                password,
                ..
            } => Some(BASE64.encode(format!("{identity}\0{username}\0{password}"))),
        }
    }

    /// Answers a base64 server challenge with a base64 response.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Auth` if the challenge is not valid base64 or
    /// the mechanism does not expect a challenge.
    pub fn respond(&self, challenge: &str) -> Result<String> {
        match self {
            Self::CramMd5 { username, secret } => {
                let challenge = BASE64.decode(challenge.trim()).map_err(|e| self.failure(e))?;
                let mut mac =
                    HmacMd5::new_from_slice(secret.as_bytes()).map_err(|e| self.failure(e))?;
                mac.update(&challenge);
                let digest = hex::encode(mac.finalize().into_bytes());
                Ok(BASE64.encode(format!("{username} {digest}")))
            }
            Self::Plain { .. } => Err(self.failure("unexpected server challenge")),
        }
    }

    /// Checks that this mechanism may be used on the current connection.
    ///
    /// PLAIN is refused over an unencrypted connection unless the server is
    /// the local host, and whenever the server name is not the host the
    /// credentials were meant for.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Auth` describing the refusal.
    pub fn check_transport(&self, encrypted: bool, server_name: &str) -> Result<()> {
        match self {
            Self::CramMd5 { .. } => Ok(()),
            Self::Plain { host, .. } => {
                if !encrypted && !is_localhost(server_name) {
                    return Err(self.failure("unencrypted connection"));
                }
                if server_name != host {
                    return Err(self.failure("wrong host name"));
                }
                Ok(())
            }
        }
    }

    fn failure(&self, reason: impl fmt::Display) -> NotifyError {
        NotifyError::Auth {
            mechanism: self.mechanism(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CramMd5 { username, .. } => f
                .debug_struct("CramMd5")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Plain {
                identity,
                username,
                host,
                ..
            } => f
                .debug_struct("Plain")
                .field("identity", identity)
                .field("username", username)
                .field("host", host)
                .finish_non_exhaustive(),
        }
    }
}

fn is_localhost(name: &str) -> bool {
    matches!(name, "localhost" | "127.0.0.1" | "::1")
}

/// TLS client settings pinned to one server name.
#[derive(Clone)]
pub struct TlsConfig {
    host: String,
    server_name: ServerName<'static>,
    client: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Creates a configuration that verifies `host` against the Mozilla
    /// root store.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidAddress` if `host` is not a valid DNS
    /// name or IP address.
    pub fn new(host: &str) -> Result<Self> {
        Self::with_client_config(host, default_client_config()?)
    }

    /// Creates a configuration for `host` using a caller-supplied rustls
    /// client configuration (for private CAs).
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidAddress` if `host` is not a valid DNS
    /// name or IP address.
    pub fn with_client_config(host: &str, client: Arc<ClientConfig>) -> Result<Self> {
        let server_name =
            ServerName::try_from(host.to_string()).map_err(|e| NotifyError::InvalidAddress {
                reason: format!("{host:?}: {e}"),
            })?;
        Ok(Self {
            host: host.to_string(),
            server_name,
            client,
        })
    }

    /// Returns the host name certificates are verified against.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.host
    }

    pub(crate) fn rustls_server_name(&self) -> ServerName<'static> {
        self.server_name.clone()
    }

    pub(crate) fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.client)
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("server_name", &self.host)
            .finish_non_exhaustive()
    }
}

fn default_client_config() -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| NotifyError::InvalidConfig {
                reason: format!("tls: {e}"),
            })?
            .with_root_certificates(roots)
            .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Splits `host:port` into its parts. IPv6 hosts must be bracketed.
///
/// # Errors
///
/// Returns `NotifyError::InvalidAddress` if the port is missing or the host
/// part is ambiguous.
pub fn split_host_port(addr: &str) -> Result<(&str, &str)> {
    let invalid = |reason: &str| NotifyError::InvalidAddress {
        reason: format!("address {addr}: {reason}"),
    };

    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| invalid("missing ']' in address"))?;
        return match after.strip_prefix(':') {
            Some(port) if !port.contains(':') => Ok((host, port)),
            Some(_) => Err(invalid("too many colons in address")),
            None => Err(invalid("missing port in address")),
        };
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port in address"))?;
    if host.contains(':') {
        return Err(invalid("too many colons in address"));
    }
    if host.contains(['[', ']']) {
        return Err(invalid("unexpected bracket in address"));
    }
    Ok((host, port))
}

/// Outcome of a negotiation: how to authenticate and whether to STARTTLS.
#[derive(Debug, Clone, Default)]
pub struct Negotiated {
    /// Authentication to perform, if any.
    pub auth: Option<SmtpAuth>,
    /// TLS settings for STARTTLS, if required.
    pub tls: Option<TlsConfig>,
}

impl Negotiated {
    /// Neither authentication nor TLS.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Chooses an authentication mechanism for one notification attempt.
#[derive(Debug, Clone)]
pub struct AuthNegotiator<'a> {
    smart_host: &'a str,
    credentials: &'a Credentials,
    client_config: Option<Arc<ClientConfig>>,
}

impl<'a> AuthNegotiator<'a> {
    /// Creates a negotiator for the given smart host and credentials.
    #[must_use]
    pub const fn new(smart_host: &'a str, credentials: &'a Credentials) -> Self {
        Self {
            smart_host,
            credentials,
            client_config: None,
        }
    }

    /// Uses `client` instead of the default root store for TLS configs.
    #[must_use]
    pub fn with_client_config(mut self, client: Option<Arc<ClientConfig>>) -> Self {
        self.client_config = client;
        self
    }

    /// Picks an authentication handle and TLS configuration.
    ///
    /// `auth_extension` is the parameter string of the server's AUTH
    /// extension, or `None` if AUTH is not advertised. Mechanisms are tried
    /// in the order the server lists them; the first one with credentials
    /// available wins. Finding none is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidAddress` if PLAIN is selected and the
    /// smart host is not a valid `host:port` address.
    pub fn negotiate(&self, auth_extension: Option<&str>) -> Result<Negotiated> {
        let Some(mechanisms) = auth_extension else {
            debug!("server does not advertise AUTH");
            return Ok(Negotiated::none());
        };

        for name in mechanisms.split(' ') {
            match AuthMechanism::from_advertised(name) {
                Some(AuthMechanism::CramMd5) => {
                    let Some(secret) = &self.credentials.secret else {
                        continue;
                    };
                    debug!(mechanism = %AuthMechanism::CramMd5, "selected SMTP auth mechanism");
                    return Ok(Negotiated {
                        auth: Some(SmtpAuth::CramMd5 {
                            username: self.credentials.username.clone(),
                            secret: secret.clone(),
                        }),
                        tls: None,
                    });
                }
                Some(AuthMechanism::Plain) => {
                    let Some(password) = &self.credentials.password else {
                        continue;
                    };
                    // Both the PLAIN handle and the TLS pin need the bare host.
                    let (host, _) = split_host_port(self.smart_host)?;
                    let tls = match &self.client_config {
                        Some(client) => TlsConfig::with_client_config(host, Arc::clone(client))?,
                        None => TlsConfig::new(host)?,
                    };
                    debug!(mechanism = %AuthMechanism::Plain, host, "selected SMTP auth mechanism");
                    return Ok(Negotiated {
                        auth: Some(SmtpAuth::Plain {
                            identity: self.credentials.identity.clone(),
                            username: self.credentials.username.clone(),
                            password: password.clone(),
                            host: host.to_string(),
                        }),
                        tls: Some(tls),
                    });
                }
                None => {}
            }
        }

        debug!(advertised = mechanisms, "no usable SMTP auth mechanism");
        Ok(Negotiated::none())
    }
}
