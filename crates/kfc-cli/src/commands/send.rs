//! Send command implementation.

use std::io::Write;

use kfc_notify::{Credentials, NotificationRequest, NotificationSender, SmtpConfig, TlsMode};
use tracing::debug;

use crate::cli::{Cli, SendArgs};
use crate::commands::{load_alert, operation};
use crate::error::CliError;
use crate::output::{DeliveryOutput, OutputFormat};

/// Handler for `send`.
#[derive(Debug)]
pub struct SendCommand {
    config: SmtpConfig,
}

impl SendCommand {
    /// Creates a send command from an SMTP configuration.
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Builds the SMTP configuration from global CLI options.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if no smart host is set or the
    /// configuration is invalid.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let smart_host = cli.smarthost.as_deref().ok_or_else(|| {
            CliError::Config("no smart host configured (--smarthost or KFC_SMTP_SMARTHOST)".into())
        })?;
        let tls_mode = if cli.implicit_tls {
            TlsMode::Implicit
        } else {
            TlsMode::StartTls
        };

        let config = SmtpConfig::new(smart_host, cli.sender.as_str())?
            .with_hello_name(cli.hello.as_str())
            .with_tls_mode(tls_mode)
            .with_timeout_secs(cli.timeout_secs);
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Delivers one notification, authenticating with credentials from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns error if the alert cannot be loaded or delivery fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SendArgs,
    ) -> Result<(), CliError> {
        self.execute_with(out, format, args, Credentials::from_env())
            .await
    }

    /// Like [`execute`](Self::execute), with explicit credentials.
    ///
    /// # Errors
    ///
    /// Returns error if the alert cannot be loaded or delivery fails.
    pub async fn execute_with<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SendArgs,
        credentials: Credentials,
    ) -> Result<(), CliError> {
        let alert = load_alert(&args.alert)?;
        let sender = NotificationSender::new(self.config.clone(), credentials)?;
        let request = NotificationRequest::new(&args.to, operation(args.resolve), &alert);

        debug!(
            smart_host = %self.config.smart_host,
            tls_mode = ?self.config.tls_mode,
            "sending notification"
        );
        sender.send(&request).await?;

        let output = DeliveryOutput {
            to: args.to.clone(),
            status: request.op.status().to_string(),
            alertname: alert.name().to_string(),
            fingerprint: alert.fingerprint(),
            smart_host: self.config.smart_host.clone(),
        };
        format.write(out, &output)
    }
}
