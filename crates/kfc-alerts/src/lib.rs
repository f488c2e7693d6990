//! Alert identity model for KFC.
//!
//! `kfc-alerts` defines the values that flow into the notification pipeline:
//!
//! - [`LabelSet`]: the identity of an alert, with fingerprinting, equality and
//!   partial matching
//! - [`Fingerprint`]: a stable 64-bit digest of a label set, used as the
//!   deduplication key
//! - [`Alert`]: a label set plus summary, description and display-only payload
//!
//! # Example
//!
//! ```rust
//! use kfc_alerts::{Alert, LabelSet};
//!
//! let a = LabelSet::new()
//!     .with_label("alertname", "HighLatency")
//!     .with_label("instance", "a");
//! let b = LabelSet::new()
//!     .with_label("instance", "b")
//!     .with_label("alertname", "HighLatency");
//!
//! assert!(a.match_on_labels(&b, &["alertname"]));
//! assert!(!a.match_on_labels(&b, &["instance"]));
//! assert_ne!(a.fingerprint(), b.fingerprint());
//!
//! let alert = Alert::new("p99 above 500ms").with_label("alertname", "HighLatency");
//! assert_eq!(alert.name(), "HighLatency");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod alert;
pub mod error;
pub mod labels;

// Re-export main types at crate root
pub use alert::{Alert, Payload};
pub use error::{AlertError, Result};
pub use labels::{ALERT_NAME_LABEL, Fingerprint, LabelSet};
