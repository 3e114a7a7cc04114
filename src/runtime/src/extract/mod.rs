//! The extraction pipeline.
//!
//! [`Coordinator`] fans model entries out to [`ModelWorker`]s under a
//! concurrency bound. Each worker fetches its image, scans the model card
//! layer and persists a metadata record; [`write_manifest`] then records the
//! outcome of the whole run.

pub mod aggregate;
pub mod coordinator;
pub mod persist;
pub mod worker;

use std::sync::Arc;

use modelcar_core::config::{ExtractorConfig, ModelEntry};
use modelcar_core::error::Result;
use modelcar_core::manifest::ModelResult;

use crate::artifacts::ReferenceArtifacts;
use crate::modelcard::FrontMatterParser;
use crate::oci::fetch::ImageFetcher;
use crate::oci::locator::BlobCache;
use crate::oci::registry::Registry;

pub use aggregate::write_manifest;
pub use coordinator::Coordinator;
pub use worker::{ModelWorker, Stage, WorkerContext};

impl WorkerContext {
    /// Context with the default parser, artifact source and an empty blob cache.
    pub fn new(config: ExtractorConfig, registry: Arc<dyn Registry>) -> Self {
        let fetcher = ImageFetcher::new(registry, config.registry_timeout());
        Self {
            fetcher,
            cache: Arc::new(BlobCache::new()),
            parser: Arc::new(FrontMatterParser::new()),
            artifacts: Arc::new(ReferenceArtifacts),
            config: Arc::new(config),
        }
    }
}

/// Process every entry, then write `manifests.yaml` into the output directory.
///
/// Only a failure to write the manifest is returned as an error; per-model
/// failures are reflected in the results.
pub async fn extract_models(
    ctx: Arc<WorkerContext>,
    entries: Vec<ModelEntry>,
) -> Result<Vec<ModelResult>> {
    let output_dir = ctx.config.output_dir.clone();
    tokio::fs::create_dir_all(&output_dir).await?;

    let results = Coordinator::new(ctx).run(entries).await;
    write_manifest(&results, &output_dir).await?;
    Ok(results)
}
