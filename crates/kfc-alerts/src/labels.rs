//! Label sets and fingerprints.
//!
//! A [`LabelSet`] is the aggregation-significant identity of an alert. Its
//! [`Fingerprint`] is a 64-bit FNV-1a digest over the sorted labels and is
//! stable across process runs, so it can be used as a deduplication key by
//! anything that stores or correlates alerts.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;
use std::str::FromStr;

use fnv::FnvHasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AlertError, Result};

/// Name of the label that carries the human-readable alert name.
pub const ALERT_NAME_LABEL: &str = "alertname";

/// Byte fed after every label name and value when fingerprinting.
const SEPARATOR: u8 = 0;

/// A 64-bit identity derived from a [`LabelSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Wraps a raw fingerprint value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw 64-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Fingerprint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Fingerprint> for u64 {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > 16 {
            return Err(AlertError::InvalidFingerprint {
                value: s.to_string(),
            });
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| AlertError::InvalidFingerprint {
                value: s.to_string(),
            })
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An immutable mapping of label names to label values.
///
/// Names are unique and case-sensitive. Iteration order is unspecified;
/// use [`LabelSet::sorted`] when a stable order is needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: HashMap<String, String>,
}

impl LabelSet {
    /// Creates an empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this set with `name` set to `value`.
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    /// Parses a single `name=value` pair, as accepted on command lines.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidLabel` if there is no `=` or the name is empty.
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
            _ => Err(AlertError::InvalidLabel {
                pair: pair.to_string(),
            }),
        }
    }

    /// Returns the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Returns the value for `name`, or the empty string when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Returns true if the set has a label called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the set has no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the `(name, value)` pairs sorted by name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        pairs
    }

    /// Computes the fingerprint of this label set.
    ///
    /// Labels are hashed in byte-wise name order as `name \0 value \0` with
    /// 64-bit FNV-1a, so the result does not depend on insertion order.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = FnvHasher::default();
        for (name, value) in self.sorted() {
            hasher.write(name.as_bytes());
            hasher.write(&[SEPARATOR]);
            hasher.write(value.as_bytes());
            hasher.write(&[SEPARATOR]);
        }
        Fingerprint(hasher.finish())
    }

    /// Returns true if both sets hold exactly the same `(name, value)` pairs.
    #[must_use]
    pub fn equal(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.labels
            .iter()
            .all(|(k, v)| other.labels.get(k) == Some(v))
    }

    /// Returns true if both sets agree on every label in `names`.
    ///
    /// A missing label reads as the empty string on either side, so a name
    /// that neither set carries matches.
    #[must_use]
    pub fn match_on_labels<S: AsRef<str>>(&self, other: &Self, names: &[S]) -> bool {
        names
            .iter()
            .all(|name| self.value(name.as_ref()) == other.value(name.as_ref()))
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for LabelSet {}

impl From<HashMap<String, String>> for LabelSet {
    fn from(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}
