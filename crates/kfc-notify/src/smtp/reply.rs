//! SMTP replies and EHLO extensions.

use std::collections::HashMap;
use std::fmt;

use crate::error::{NotifyError, Result};

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    lines: Vec<String>,
}

/// One parsed reply line: code, whether more lines follow, and the text.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ReplyLine<'a> {
    pub code: u16,
    pub more: bool,
    pub text: &'a str,
}

impl Reply {
    /// Creates a reply from its code and text lines.
    #[must_use]
    pub fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns the three-digit reply code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Returns the text of every line, without codes.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the text of the first line.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.lines.first().map_or("", String::as_str)
    }

    /// Returns true for 2xx replies.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Parses a single reply line such as `250-PIPELINING` or `220 ready`.
    pub(crate) fn parse_line(line: &str) -> Result<ReplyLine<'_>> {
        let bytes = line.as_bytes();
        let valid_code = bytes.len() >= 3
            && (b'2'..=b'5').contains(&bytes[0])
            && bytes[1].is_ascii_digit()
            && bytes[2].is_ascii_digit();
        if !valid_code {
            return Err(NotifyError::Protocol {
                reason: format!("malformed reply line {line:?}"),
            });
        }

        let code = u16::from(bytes[0] - b'0') * 100
            + u16::from(bytes[1] - b'0') * 10
            + u16::from(bytes[2] - b'0');
        let (more, text) = match bytes.get(3).copied() {
            None => (false, ""),
            Some(b' ') => (false, &line[4..]),
            Some(b'-') => (true, &line[4..]),
            Some(_) => {
                return Err(NotifyError::Protocol {
                    reason: format!("malformed reply line {line:?}"),
                });
            }
        };
        Ok(ReplyLine { code, more, text })
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.lines.join("; "))
    }
}

/// Service extensions advertised in an EHLO reply.
///
/// Keywords are stored upper-cased; parameters are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    entries: HashMap<String, String>,
}

impl Extensions {
    /// Extracts extensions from a successful EHLO reply.
    ///
    /// The first line is the server greeting and carries no extension.
    #[must_use]
    pub fn from_ehlo(reply: &Reply) -> Self {
        let entries = reply
            .lines()
            .iter()
            .skip(1)
            .filter(|line| !line.is_empty())
            .map(|line| {
                let (keyword, params) = line.split_once(' ').unwrap_or((line.as_str(), ""));
                (keyword.to_ascii_uppercase(), params.to_string())
            })
            .collect();
        Self { entries }
    }

    /// Returns the parameters of `keyword`, or `None` if not advertised.
    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries
            .get(&keyword.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Returns true if `keyword` is advertised.
    #[must_use]
    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// Returns true if no extensions are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
