//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`send`] - Deliver a notification through the smart host
//! - [`render`] - Print the message without sending it
//! - [`fingerprint`] - Fingerprint a label set

pub mod fingerprint;
pub mod render;
pub mod send;

pub use fingerprint::FingerprintCommand;
pub use render::RenderCommand;
pub use send::SendCommand;

use kfc_alerts::Alert;
use kfc_notify::NotificationOp;

use crate::cli::AlertArgs;
use crate::error::CliError;

/// Builds the alert described by `args`, reading the JSON file if given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid alert.
pub fn load_alert(args: &AlertArgs) -> Result<Alert, CliError> {
    if let Some(path) = &args.alert_file {
        let json = std::fs::read_to_string(path)?;
        return Ok(Alert::from_json(&json)?);
    }

    let mut alert = Alert::new(args.summary.clone().unwrap_or_default());
    if let Some(description) = &args.description {
        alert = alert.with_description(description.clone());
    }
    for (name, value) in &args.label {
        alert = alert.with_label(name.clone(), value.clone());
    }
    for (name, value) in &args.payload {
        alert = alert.with_payload(name.clone(), value.clone());
    }
    Ok(alert)
}

/// Maps the `--resolve` flag to a notification operation.
#[must_use]
pub const fn operation(resolve: bool) -> NotificationOp {
    if resolve {
        NotificationOp::Resolve
    } else {
        NotificationOp::Trigger
    }
}
