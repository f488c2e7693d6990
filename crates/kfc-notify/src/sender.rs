//! Delivery of a single notification through the smart host.
//!
//! [`NotificationSender::send`] runs one SMTP session per call: connect,
//! EHLO, negotiate auth, STARTTLS if required, authenticate, envelope, DATA,
//! QUIT. Nothing is retried and nothing is queued; the caller decides what
//! to do with a failure.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use kfc_alerts::Alert;
use rustls::ClientConfig;
use tracing::{debug, info, warn};

use crate::auth::{AuthNegotiator, TlsConfig, split_host_port};
use crate::config::{Credentials, SmtpConfig, TlsMode};
use crate::error::{NotifyError, Result};
use crate::render::{NotificationOp, render_to_vec};
use crate::smtp::SmtpSession;

/// Everything needed for one notification attempt.
///
/// Assembled right before [`NotificationSender::send`] and not retained.
#[derive(Debug, Clone, Copy)]
pub struct NotificationRequest<'a> {
    /// Recipient address.
    pub to: &'a str,
    /// Whether the alert triggered or resolved.
    pub op: NotificationOp,
    /// The alert being reported.
    pub alert: &'a Alert,
    /// Time written into the `Date` header.
    pub timestamp: DateTime<FixedOffset>,
}

impl<'a> NotificationRequest<'a> {
    /// Creates a request stamped with the current local time.
    #[must_use]
    pub fn new(to: &'a str, op: NotificationOp, alert: &'a Alert) -> Self {
        Self {
            to,
            op,
            alert,
            timestamp: Local::now().fixed_offset(),
        }
    }

    /// Overrides the timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Sends alert notifications by email through a configured smart host.
///
/// The sender holds only immutable configuration, so one instance can be
/// shared (e.g. in an `Arc`) by concurrent tasks.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    config: SmtpConfig,
    credentials: Credentials,
    tls_client: Option<Arc<ClientConfig>>,
}

impl NotificationSender {
    /// Creates a sender.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidConfig` if the configuration fails
    /// validation.
    pub fn new(config: SmtpConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            credentials,
            tls_client: None,
        })
    }

    /// Uses a custom rustls client configuration (e.g. a private CA) for
    /// STARTTLS and implicit TLS instead of the bundled Mozilla roots.
    #[must_use]
    pub fn with_tls_client_config(mut self, client: Arc<ClientConfig>) -> Self {
        self.tls_client = Some(client);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// Renders the message body for `request` without sending it.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Render` if rendering fails.
    pub fn render(&self, request: &NotificationRequest<'_>) -> Result<Vec<u8>> {
        render_to_vec(
            &self.config.sender,
            request.to,
            request.op.status(),
            request.alert,
            &request.timestamp,
        )
    }

    /// Delivers one notification.
    ///
    /// The whole exchange runs under the configured deadline. On any error
    /// the attempt stops and the connection is closed. A failure during or
    /// after DATA means delivery state is unknown.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; see [`NotifyError`].
    pub async fn send(&self, request: &NotificationRequest<'_>) -> Result<()> {
        let deadline = self.config.timeout();
        match tokio::time::timeout(deadline, self.attempt(request)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(deadline)),
        }
    }

    async fn attempt(&self, request: &NotificationRequest<'_>) -> Result<()> {
        let body = self.render(request)?;

        let mut session = self.connect().await?;
        session.hello(&self.config.hello_name).await?;

        let negotiated = AuthNegotiator::new(&self.config.smart_host, &self.credentials)
            .with_client_config(self.tls_client.clone())
            .negotiate(session.extension("AUTH"))?;

        if let Some(tls) = &negotiated.tls {
            if !session.is_encrypted() {
                session = session.starttls(tls).await?;
                session
                    .hello(&self.config.hello_name)
                    .await
                    .map_err(|e| NotifyError::StartTls {
                        reason: e.to_string(),
                    })?;
            }
        }

        if let Some(auth) = &negotiated.auth {
            session.auth(auth).await?;
        }

        session.mail(&self.config.sender).await?;
        session.rcpt(request.to).await?;
        session.data(&body).await?;

        if let Err(e) = session.quit().await {
            warn!(error = %e, "QUIT failed after message was accepted");
        }

        info!(
            to = request.to,
            alert = request.alert.name(),
            fingerprint = %request.alert.fingerprint(),
            status = request.op.status(),
            "notification delivered"
        );
        Ok(())
    }

    async fn connect(&self) -> Result<SmtpSession> {
        let addr = self.config.smart_host.as_str();
        match self.config.tls_mode {
            TlsMode::StartTls => {
                let host = split_host_port(addr).map_or(addr, |(host, _)| host);
                debug!(addr, "connecting to smart host");
                SmtpSession::connect(addr, host).await
            }
            TlsMode::Implicit => {
                let (host, _) = split_host_port(addr)?;
                let tls = match &self.tls_client {
                    Some(client) => TlsConfig::with_client_config(host, Arc::clone(client))?,
                    None => TlsConfig::new(host)?,
                };
                debug!(addr, "connecting to smart host with implicit TLS");
                SmtpSession::connect_tls(addr, &tls).await
            }
        }
    }
}
