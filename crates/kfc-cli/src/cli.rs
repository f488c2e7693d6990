//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kfc_alerts::LabelSet;
use kfc_notify::config::{DEFAULT_HELLO_NAME, DEFAULT_SENDER, DEFAULT_TIMEOUT_SECS};

/// KFC - render and deliver alert notifications by email.
#[derive(Parser, Debug, Clone)]
#[command(name = "kfc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Smart host to relay through, as `host:port`.
    #[arg(long, global = true, env = "KFC_SMTP_SMARTHOST")]
    pub smarthost: Option<String>,

    /// Envelope sender and `From` address.
    #[arg(long, global = true, env = "KFC_SMTP_SENDER", default_value = DEFAULT_SENDER)]
    pub sender: String,

    /// Name announced in EHLO/HELO.
    #[arg(long, global = true, default_value = DEFAULT_HELLO_NAME)]
    pub hello: String,

    /// Connect with TLS from the start instead of STARTTLS.
    #[arg(long, global = true)]
    pub implicit_tls: bool,

    /// Deadline for one delivery attempt, in seconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Send a notification for an alert through the smart host.
    Send(SendArgs),

    /// Print the message that would be sent, without connecting.
    Render(RenderArgs),

    /// Print the fingerprint of a label set.
    Fingerprint(FingerprintArgs),
}

/// Where the alert comes from: a JSON file or individual flags.
#[derive(Args, Debug, Clone, Default)]
pub struct AlertArgs {
    /// Read the alert from a JSON file.
    #[arg(long, conflicts_with_all = ["summary", "description", "label", "payload"])]
    pub alert_file: Option<PathBuf>,

    /// One-line summary used in the subject.
    #[arg(long)]
    pub summary: Option<String>,

    /// Free-form body text.
    #[arg(long)]
    pub description: Option<String>,

    /// Grouping label, as `name=value` (repeatable).
    #[arg(short, long = "label", value_parser = parse_pair)]
    pub label: Vec<(String, String)>,

    /// Payload label, as `name=value` (repeatable).
    #[arg(short, long = "payload", value_parser = parse_pair)]
    pub payload: Vec<(String, String)>,
}

/// Arguments for `send`.
#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Recipient address.
    #[arg(long)]
    pub to: String,

    /// Report the alert as resolved instead of triggered.
    #[arg(long)]
    pub resolve: bool,

    /// The alert to report.
    #[command(flatten)]
    pub alert: AlertArgs,
}

/// Arguments for `render`.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Recipient address written into the `To` header.
    #[arg(long)]
    pub to: String,

    /// Render the resolved variant.
    #[arg(long)]
    pub resolve: bool,

    /// The alert to render.
    #[command(flatten)]
    pub alert: AlertArgs,
}

/// Arguments for `fingerprint`.
#[derive(Args, Debug, Clone)]
pub struct FingerprintArgs {
    /// Label, as `name=value` (repeatable).
    #[arg(short, long = "label", value_parser = parse_pair)]
    pub label: Vec<(String, String)>,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    LabelSet::parse_pair(s).map_err(|e| e.to_string())
}
