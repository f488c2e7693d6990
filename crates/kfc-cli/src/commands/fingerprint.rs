//! Fingerprint command implementation.

use std::io::Write;

use kfc_alerts::LabelSet;

use crate::cli::FingerprintArgs;
use crate::error::CliError;
use crate::output::{FingerprintOutput, OutputFormat};

/// Handler for `fingerprint`.
#[derive(Debug, Default)]
pub struct FingerprintCommand;

impl FingerprintCommand {
    /// Creates a new fingerprint command handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Prints the fingerprint of the given labels.
    ///
    /// # Errors
    ///
    /// Returns error if writing the output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &FingerprintArgs,
    ) -> Result<(), CliError> {
        let labels: LabelSet = args.label.iter().cloned().collect();
        format.write(out, &FingerprintOutput::new(&labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;

    #[test]
    fn fingerprint_ignores_label_order() {
        let run = |labels: Vec<(&str, &str)>| {
            let args = FingerprintArgs {
                label: labels
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            let mut out = Vec::new();
            FingerprintCommand::new()
                .execute(&mut out, &OutputFormat::new(Format::Json), &args)
                .unwrap();
            String::from_utf8(out).unwrap()
        };

        let a = run(vec![("alertname", "HighLatency"), ("instance", "b")]);
        let b = run(vec![("instance", "b"), ("alertname", "HighLatency")]);
        assert_eq!(a, b);
        assert!(a.contains("a317b34ee864e6b7"));
    }
}
