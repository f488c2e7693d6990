//! # kfc-cli
//!
//! Command-line front end for KFC alert notifications.
//!
//! Provides commands for:
//! - Sending a trigger or resolve notification through a smart host
//! - Rendering the notification message locally
//! - Computing label-set fingerprints
//!
//! SMTP credentials are read from `SMTP_AUTH_USERNAME`, `SMTP_AUTH_SECRET`,
//! `SMTP_AUTH_PASSWORD` and `SMTP_AUTH_IDENTITY`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{AlertArgs, Cli, Commands, FingerprintArgs, Format, RenderArgs, SendArgs};
pub use error::CliError;
pub use output::OutputFormat;
