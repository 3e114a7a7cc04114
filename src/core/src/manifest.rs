//! Per-model results and the run manifest (`manifests.yaml`).

use serde::{Deserialize, Serialize};

use crate::metadata::ExtractedMetadata;

/// Outcome of processing one image reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult {
    /// Reference exactly as listed in the models index
    pub reference: String,
    /// Whether a single model card was extracted
    pub model_card_found: bool,
    pub metadata: ExtractedMetadata,
}

impl ModelResult {
    /// Result for an image that could not be reached at all.
    pub fn unreachable(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            model_card_found: false,
            metadata: ExtractedMetadata::default(),
        }
    }
}

/// Top-level manifest record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestsData {
    #[serde(default)]
    pub models: Vec<ModelManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelManifest {
    #[serde(rename = "ref")]
    pub reference: String,
    pub model_card: ModelCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub present: bool,
    pub metadata: ExtractedMetadata,
}

impl ManifestsData {
    /// Build the manifest in the order results arrived.
    pub fn from_results(results: &[ModelResult]) -> Self {
        let models = results
            .iter()
            .map(|result| ModelManifest {
                reference: result.reference.clone(),
                model_card: ModelCard {
                    present: result.model_card_found,
                    metadata: result.metadata.clone(),
                },
            })
            .collect();
        Self { models }
    }
}
