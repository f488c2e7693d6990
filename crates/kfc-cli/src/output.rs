//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use kfc_alerts::{Fingerprint, LabelSet};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A label as shown in command output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    /// Label name.
    pub name: String,
    /// Label value.
    pub value: String,
}

fn sorted_entries(labels: &LabelSet) -> Vec<LabelEntry> {
    labels
        .sorted()
        .into_iter()
        .map(|(name, value)| LabelEntry {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}

/// Result of `fingerprint`.
#[derive(Debug, Clone, Serialize)]
pub struct FingerprintOutput {
    /// Fingerprint of the label set.
    pub fingerprint: Fingerprint,
    /// The labels, sorted by name.
    pub labels: Vec<LabelEntry>,
}

impl FingerprintOutput {
    /// Builds the output for `labels`.
    #[must_use]
    pub fn new(labels: &LabelSet) -> Self {
        Self {
            fingerprint: labels.fingerprint(),
            labels: sorted_entries(labels),
        }
    }
}

impl TableDisplay for FingerprintOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Fingerprint:  {}", self.fingerprint)?;
        if self.labels.is_empty() {
            writeln!(writer, "Labels:       (none)")?;
            return Ok(());
        }
        writeln!(writer, "Labels:")?;
        for entry in &self.labels {
            writeln!(writer, "  {:<20}  {}", entry.name, entry.value)?;
        }
        Ok(())
    }
}

/// Result of `render`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    /// Recipient written into the message.
    pub to: String,
    /// `ALERT` or `RESOLVED`.
    pub status: String,
    /// Fingerprint of the alert's grouping labels.
    pub fingerprint: Fingerprint,
    /// The rendered message.
    pub message: String,
}

impl TableDisplay for RenderOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        // Print the message as-is so it can be piped into other tools.
        write!(writer, "{}", self.message)?;
        if !self.message.ends_with('\n') {
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Result of `send`.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutput {
    /// Recipient address.
    pub to: String,
    /// `ALERT` or `RESOLVED`.
    pub status: String,
    /// Value of the `alertname` label.
    pub alertname: String,
    /// Fingerprint of the alert's grouping labels.
    pub fingerprint: Fingerprint,
    /// Smart host the message was relayed through.
    pub smart_host: String,
}

impl TableDisplay for DeliveryOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "✓ [{}] {} ({}) sent to {} via {}",
            self.status, self.alertname, self.fingerprint, self.to, self.smart_host
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::new()
            .with_label("instance", "a")
            .with_label("alertname", "HighLatency")
    }

    #[test]
    fn fingerprint_table_lists_sorted_labels() {
        let output = OutputFormat::new(Format::Table)
            .to_string(&FingerprintOutput::new(&labels()))
            .unwrap();

        assert!(output.starts_with("Fingerprint:  a30d814ee85c3d3c\n"));
        let alertname = output.find("alertname").unwrap();
        let instance = output.find("instance").unwrap();
        assert!(alertname < instance);
    }

    #[test]
    fn fingerprint_json_uses_hex_string() {
        let format = OutputFormat::new(Format::Json);
        assert!(format.is_json());

        let output = format.to_string(&FingerprintOutput::new(&labels())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["fingerprint"], "a30d814ee85c3d3c");
        assert_eq!(value["labels"][0]["name"], "alertname");
        assert_eq!(value["labels"][1]["value"], "a");
    }

    #[test]
    fn empty_label_set_table() {
        let output = OutputFormat::default()
            .to_string(&FingerprintOutput::new(&LabelSet::new()))
            .unwrap();
        assert_eq!(
            output,
            "Fingerprint:  cbf29ce484222325\nLabels:       (none)\n"
        );
    }

    #[test]
    fn render_table_prints_message_verbatim() {
        let render = RenderOutput {
            to: "a@example.org".into(),
            status: "ALERT".into(),
            fingerprint: Fingerprint::new(1),
            message: "Subject: x\n\nbody".into(),
        };
        let output = OutputFormat::default().to_string(&render).unwrap();
        assert_eq!(output, "Subject: x\n\nbody\n");
    }

    #[test]
    fn delivery_table_line() {
        let delivery = DeliveryOutput {
            to: "oncall@example.org".into(),
            status: "RESOLVED".into(),
            alertname: "HighLatency".into(),
            fingerprint: Fingerprint::new(0xa30d_814e_e85c_3d3c),
            smart_host: "smtp.example.com:587".into(),
        };
        let output = OutputFormat::default().to_string(&delivery).unwrap();
        assert_eq!(
            output,
            "✓ [RESOLVED] HighLatency (a30d814ee85c3d3c) sent to oncall@example.org via smtp.example.com:587\n"
        );
    }
}
