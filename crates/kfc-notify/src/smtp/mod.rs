//! Minimal SMTP client plumbing.
//!
//! - [`Reply`] and [`Extensions`]: parsing of server replies and EHLO keywords
//! - [`encode_data`]: DATA payload encoding (CRLF line endings, dot-stuffing)
//! - [`SmtpSession`]: one client session over plain TCP or TLS

mod data;
mod reply;
mod session;

pub use data::encode_data;
pub use reply::{Extensions, Reply};
pub use session::SmtpSession;
