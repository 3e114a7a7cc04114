//! Per-model metadata records as persisted in `metadata.yaml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata type tag used for plain string custom properties.
pub const METADATA_STRING_VALUE: &str = "MetadataStringValue";

/// Metadata extracted from a model card, later enriched and merged into the catalog.
///
/// Timestamps are epoch milliseconds. Optional scalars are omitted from the
/// YAML when absent; lists are always written so downstream stages can rely
/// on their presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_link: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default)]
    pub artifacts: Vec<OciArtifact>,
}

/// An OCI artifact backing a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciArtifact {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: BTreeMap<String, MetadataValue>,
}

impl OciArtifact {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }
}

/// A typed custom property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataValue {
    #[serde(rename = "metadataType")]
    pub metadata_type: String,
    #[serde(default)]
    pub string_value: String,
}

impl MetadataValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            metadata_type: METADATA_STRING_VALUE.to_string(),
            string_value: value.into(),
        }
    }
}

/// Creation and last-update times of an image, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamps {
    pub created: Option<i64>,
    pub updated: Option<i64>,
}

impl ExtractedMetadata {
    /// Minimal record written when no model card could be extracted.
    pub fn skeleton(artifacts: Vec<OciArtifact>) -> Self {
        Self {
            tags: Vec::new(),
            language: Vec::new(),
            tasks: Vec::new(),
            artifacts,
            ..Default::default()
        }
    }

    /// Fill timestamps that are still unset.
    ///
    /// Values already present on an artifact win over `timestamps`.
    pub fn apply_timestamps(&mut self, timestamps: Timestamps) {
        if self.create_time_since_epoch.is_none() {
            self.create_time_since_epoch = timestamps.created;
        }
        if self.last_update_time_since_epoch.is_none() {
            self.last_update_time_since_epoch = timestamps.updated;
        }
        for artifact in &mut self.artifacts {
            if artifact.create_time_since_epoch.is_none() {
                artifact.create_time_since_epoch = timestamps.created;
            }
            if artifact.last_update_time_since_epoch.is_none() {
                artifact.last_update_time_since_epoch = timestamps.updated;
            }
        }
    }

    /// Append labels to the tag list, keeping first-appearance order.
    ///
    /// Empty labels and labels already present are ignored. Returns `true`
    /// when at least one tag was added.
    pub fn merge_labels<S: AsRef<str>>(&mut self, labels: &[S]) -> bool {
        let mut changed = false;
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() || self.tags.iter().any(|t| t == label) {
                continue;
            }
            self.tags.push(label.to_string());
            changed = true;
        }
        changed
    }
}
