use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ModelcarError, Result};

/// Annotation key marking a layer as the model card layer.
pub const DOC_LAYER_ANNOTATION_KEY: &str = "io.opendatahub.modelcar.layer.type";

/// Annotation value expected under [`DOC_LAYER_ANNOTATION_KEY`].
pub const DOC_LAYER_ANNOTATION_VALUE: &str = "modelcard";

/// Extension of the documentation file inside the model card layer.
pub const DOC_FILE_EXTENSION: &str = ".md";

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Directory receiving one sub-directory per model plus `manifests.yaml`
    pub output_dir: PathBuf,

    /// Maximum number of models processed at once.
    ///
    /// Kept signed so a non-positive value from the command line can be
    /// corrected instead of rejected; see [`ExtractorConfig::effective_concurrency`].
    pub max_concurrent: i64,

    /// Time budget for each registry call, in seconds
    pub registry_timeout_secs: u64,

    /// How the documentation layer is recognised
    pub doc_layer: DocLayerConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            max_concurrent: 5,
            registry_timeout_secs: 60,
            doc_layer: DocLayerConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from a YAML file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ModelcarError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_yaml::from_str(&data).map_err(|e| {
            ModelcarError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Number of permits for the worker pool. Never zero.
    pub fn effective_concurrency(&self) -> usize {
        if self.max_concurrent < 1 {
            tracing::warn!(
                max_concurrent = self.max_concurrent,
                "Invalid max-concurrent value; defaulting to 1"
            );
            return 1;
        }
        usize::try_from(self.max_concurrent).unwrap_or(usize::MAX)
    }

    /// Per-call registry timeout.
    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }
}

/// Documentation layer matching rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocLayerConfig {
    pub annotation_key: String,
    pub annotation_value: String,
    /// File name suffix of the documentation entry
    pub extension: String,
}

impl Default for DocLayerConfig {
    fn default() -> Self {
        Self {
            annotation_key: DOC_LAYER_ANNOTATION_KEY.to_string(),
            annotation_value: DOC_LAYER_ANNOTATION_VALUE.to_string(),
            extension: DOC_FILE_EXTENSION.to_string(),
        }
    }
}

/// One model listed in the models index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Source type, `oci` for registry-hosted modelcars
    #[serde(rename = "type", default)]
    pub source_type: String,

    /// Image reference (registry/repo:tag)
    pub uri: String,

    /// Labels merged into the model's tags after extraction
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ModelEntry {
    /// Entry for a bare OCI reference with no labels.
    pub fn oci(uri: impl Into<String>) -> Self {
        Self {
            source_type: "oci".to_string(),
            uri: uri.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Models index file (`models-index.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsIndex {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ModelsIndex {
    /// Load the models index from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ModelcarError::ConfigError(format!(
                "Failed to read models index {}: {}",
                path.display(),
                e
            ))
        })?;
        let index: ModelsIndex = serde_yaml::from_str(&data).map_err(|e| {
            ModelcarError::ConfigError(format!(
                "Failed to parse models index {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            models = index.models.len(),
            "Loaded models index"
        );
        Ok(index)
    }
}
