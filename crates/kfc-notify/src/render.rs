//! Rendering of notification messages.
//!
//! The message is built section by section: a header block (`From`, `To`,
//! `Date`, `Subject`), a blank line, the alert description, then the grouping
//! labels and payload entries as `name = "value"` lines. Lines end in `\n`;
//! the DATA encoder turns them into CRLF on the wire.

use std::fmt;
use std::io::Write;

use chrono::{DateTime, TimeZone};
use kfc_alerts::Alert;
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};

/// Display name used in the `From` header.
pub const FROM_DISPLAY_NAME: &str = "KFC2K";

/// `Date` header format, e.g. `Mon, 2 Jan 2006 15:04:05 -0700`.
pub const DATE_FORMAT: &str = "%a, %-d %b %Y %H:%M:%S %z";

/// The state transition a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationOp {
    /// The alert started firing.
    Trigger,
    /// The alert stopped firing.
    Resolve,
}

impl NotificationOp {
    /// Returns the status tag used in the subject line.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Trigger => "ALERT",
            Self::Resolve => "RESOLVED",
        }
    }
}

impl fmt::Display for NotificationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status())
    }
}

/// Writes the notification message for `alert` into `w`.
///
/// Missing fields (including a missing `alertname`) render as empty strings.
/// Labels and payload entries are written once each, sorted by name.
///
/// # Errors
///
/// Returns `NotifyError::Render` if `w` rejects a write.
pub fn render_message<W, Tz>(
    w: &mut W,
    from: &str,
    to: &str,
    status: &str,
    alert: &Alert,
    moment: &DateTime<Tz>,
) -> Result<()>
where
    W: Write + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    write_sections(w, from, to, status, alert, moment).map_err(NotifyError::Render)
}

/// Renders the notification message into a new buffer.
///
/// # Errors
///
/// Only fails if formatting into memory fails, which it does not in practice.
pub fn render_to_vec<Tz>(
    from: &str,
    to: &str,
    status: &str,
    alert: &Alert,
    moment: &DateTime<Tz>,
) -> Result<Vec<u8>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut buf = Vec::with_capacity(512);
    render_message(&mut buf, from, to, status, alert, moment)?;
    Ok(buf)
}

fn write_sections<W, Tz>(
    w: &mut W,
    from: &str,
    to: &str,
    status: &str,
    alert: &Alert,
    moment: &DateTime<Tz>,
) -> std::io::Result<()>
where
    W: Write + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    writeln!(w, "From: {FROM_DISPLAY_NAME} <{}>", header_value(from))?;
    writeln!(w, "To: {}", header_value(to))?;
    writeln!(w, "Date: {}", moment.format(DATE_FORMAT))?;
    writeln!(
        w,
        "Subject: [{}] {}: {}",
        header_value(status),
        header_value(alert.name()),
        header_value(&alert.summary)
    )?;
    writeln!(w)?;
    writeln!(w, "{}", alert.description)?;

    writeln!(w, "Grouping labels:")?;
    for (name, value) in alert.labels.sorted() {
        write!(w, "\n  {name} = \"{value}\"")?;
    }

    let mut payload: Vec<_> = alert.payload.iter().collect();
    payload.sort_unstable_by(|a, b| a.0.cmp(b.0));
    writeln!(w, "\nPayload labels:")?;
    for (name, value) in payload {
        write!(w, "\n  {name} = \"{value}\"")?;
    }
    writeln!(w)?;
    w.flush()
}

/// Folds any line breaks out of a header value.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
