//! Modelcar Runtime - model card extraction from OCI modelcar images.
//!
//! This crate implements the extraction pipeline: registry access, model card
//! layer scanning, per-model persistence under bounded concurrency, and the
//! catalog merge that runs over the extraction output.

#![allow(clippy::result_large_err)]

pub mod artifacts;
pub mod catalog;
pub mod extract;
pub mod modelcard;
pub mod oci;

// Re-export common types
pub use artifacts::{ArtifactSource, ReferenceArtifacts};
pub use catalog::{
    create_catalog, generate_catalog, load_static_catalogs, CatalogMetadata, ModelsCatalog,
};
pub use extract::{extract_models, write_manifest, Coordinator, ModelWorker, WorkerContext};
pub use modelcard::{FrontMatterParser, ModelCardParser};
pub use oci::{BlobCache, ImageFetcher, ImageReference, OciRegistry, Registry, RegistryAuth};

/// Modelcar Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
