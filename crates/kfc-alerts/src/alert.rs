//! The alert value handed to the notification pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::labels::{ALERT_NAME_LABEL, Fingerprint, LabelSet};

/// Extra key/value information that is displayed but not used for identity.
pub type Payload = HashMap<String, String>;

/// An alert as produced by an upstream evaluator.
///
/// `labels` must minimally include an `alertname` label; a missing name is
/// tolerated and reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Short summary of the alert.
    pub summary: String,
    /// Long description of the alert.
    #[serde(default)]
    pub description: String,
    /// Label value pairs used for aggregation, matching and dispatching.
    pub labels: LabelSet,
    /// Extra key/value information which is not used for aggregation.
    #[serde(default)]
    pub payload: Payload,
}

impl Alert {
    /// Creates an alert with the given summary and nothing else.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels = self.labels.with_label(name, value);
        self
    }

    /// Adds a payload entry.
    #[must_use]
    pub fn with_payload(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// Decodes an alert from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::SerializationError` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the value of the `alertname` label, or `""` when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        self.labels.value(ALERT_NAME_LABEL)
    }

    /// Returns the fingerprint of the alert's label set.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.labels.fingerprint()
    }
}
