//! Render command implementation.

use std::io::Write;

use kfc_notify::{NotificationRequest, render_to_vec};

use crate::cli::RenderArgs;
use crate::commands::{load_alert, operation};
use crate::error::CliError;
use crate::output::{OutputFormat, RenderOutput};

/// Handler for `render`.
pub struct RenderCommand<'a> {
    sender: &'a str,
}

impl<'a> RenderCommand<'a> {
    /// Creates a render command using `sender` as the `From` address.
    #[must_use]
    pub const fn new(sender: &'a str) -> Self {
        Self { sender }
    }

    /// Prints the notification message without contacting any server.
    ///
    /// # Errors
    ///
    /// Returns error if the alert cannot be loaded or writing fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &RenderArgs,
    ) -> Result<(), CliError> {
        let alert = load_alert(&args.alert)?;
        let request = NotificationRequest::new(&args.to, operation(args.resolve), &alert);

        let message = render_to_vec(
            self.sender,
            request.to,
            request.op.status(),
            &alert,
            &request.timestamp,
        )?;

        let output = RenderOutput {
            to: args.to.clone(),
            status: request.op.status().to_string(),
            fingerprint: alert.fingerprint(),
            message: String::from_utf8_lossy(&message).into_owned(),
        };
        format.write(out, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AlertArgs, Format};

    fn args(resolve: bool) -> RenderArgs {
        RenderArgs {
            to: "oncall@example.org".into(),
            resolve,
            alert: AlertArgs {
                summary: Some("p99 above 500ms".into()),
                label: vec![("alertname".into(), "HighLatency".into())],
                ..AlertArgs::default()
            },
        }
    }

    #[test]
    fn renders_trigger_message() {
        let mut out = Vec::new();
        RenderCommand::new("kfc@example.org")
            .execute(&mut out, &OutputFormat::default(), &args(false))
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("From: KFC2K <kfc@example.org>\nTo: oncall@example.org\n"));
        assert!(text.contains("Subject: [ALERT] HighLatency: p99 above 500ms\n"));
        assert!(text.contains("Grouping labels:\n\n  alertname = \"HighLatency\""));
    }

    #[test]
    fn renders_resolved_json() {
        let mut out = Vec::new();
        RenderCommand::new("kfc@example.org")
            .execute(&mut out, &OutputFormat::new(Format::Json), &args(true))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["status"], "RESOLVED");
        assert_eq!(value["to"], "oncall@example.org");
        assert!(
            value["message"]
                .as_str()
                .unwrap()
                .contains("Subject: [RESOLVED] HighLatency")
        );
    }
}
