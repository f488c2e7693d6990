//! SMTP notification delivery for KFC alerts.
//!
//! `kfc-notify` turns an [`kfc_alerts::Alert`] and a state transition into an
//! email and delivers it through a smart host.
//!
//! # Features
//!
//! - **Rendering**: a fixed, deterministic plain-text layout with a
//!   `[ALERT]`/`[RESOLVED]` subject tag ([`render_message`])
//! - **Auth negotiation**: CRAM-MD5 or PLAIN, chosen from what the server
//!   advertises and which secrets are configured ([`AuthNegotiator`])
//! - **Transport security**: STARTTLS whenever PLAIN is used, or implicit TLS
//! - **Single attempt**: one session per notification, bounded by a deadline,
//!   no retries ([`NotificationSender`])
//!
//! # Example
//!
//! ```rust,no_run
//! use kfc_alerts::Alert;
//! use kfc_notify::{
//!     Credentials, NotificationOp, NotificationRequest, NotificationSender, SmtpConfig,
//! };
//!
//! # async fn run() -> kfc_notify::Result<()> {
//! let config = SmtpConfig::new("smtp.example.com:587", "kfc@example.org")?;
//! let sender = NotificationSender::new(config, Credentials::from_env())?;
//!
//! let alert = Alert::new("p99 above 500ms")
//!     .with_label("alertname", "HighLatency")
//!     .with_label("instance", "api-1");
//!
//! let request = NotificationRequest::new("oncall@example.org", NotificationOp::Trigger, &alert);
//! sender.send(&request).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod render;
pub mod sender;
pub mod smtp;

// Re-export main types at crate root
pub use auth::{AuthMechanism, AuthNegotiator, Negotiated, SmtpAuth, TlsConfig, split_host_port};
pub use config::{Credentials, SmtpConfig, TlsMode};
pub use error::{NotifyError, Result};
pub use render::{NotificationOp, render_message, render_to_vec};
pub use sender::{NotificationRequest, NotificationSender};
