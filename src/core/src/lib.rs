//! Modelcar Core - foundational types for model card extraction.
//!
//! This crate holds the types shared by the extraction runtime and the CLI:
//! the error taxonomy, run configuration, persisted metadata records and
//! the run manifest.

pub mod config;
pub mod error;
pub mod manifest;
pub mod metadata;

// Re-export commonly used types
pub use config::{DocLayerConfig, ExtractorConfig, ModelEntry, ModelsIndex};
pub use error::{ModelcarError, Result};
pub use manifest::{ManifestsData, ModelCard, ModelManifest, ModelResult};
pub use metadata::{ExtractedMetadata, MetadataValue, OciArtifact, Timestamps};

/// Modelcar version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
