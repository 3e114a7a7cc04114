//! Per-model extraction.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use modelcar_core::config::{ExtractorConfig, ModelEntry};
use modelcar_core::error::{ModelcarError, Result};
use modelcar_core::manifest::ModelResult;
use modelcar_core::metadata::{ExtractedMetadata, Timestamps};

use super::persist;
use crate::artifacts::ArtifactSource;
use crate::modelcard::ModelCardParser;
use crate::oci::archive::{scan_doc_archive, DocFile};
use crate::oci::fetch::{FetchedImage, ImageFetcher};
use crate::oci::locator::{doc_layer_candidates, fetch_blob, BlobCache};
use crate::oci::registry::LayerDescriptor;
use crate::oci::timestamps::ImageTimestamps;

/// Where a worker is in its pipeline, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Locating,
    Decompressing,
    Scanning,
    Extracting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Locating => "locating",
            Stage::Decompressing => "decompressing",
            Stage::Scanning => "scanning",
            Stage::Extracting => "extracting",
        };
        f.write_str(name)
    }
}

/// Collaborators shared by every worker in a run.
pub struct WorkerContext {
    pub fetcher: ImageFetcher,
    pub cache: Arc<BlobCache>,
    pub parser: Arc<dyn ModelCardParser>,
    pub artifacts: Arc<dyn ArtifactSource>,
    pub config: Arc<ExtractorConfig>,
}

/// A model card written to disk.
struct Extracted {
    flags: ExtractedMetadata,
    metadata_path: PathBuf,
}

/// Processes one model entry end to end.
#[derive(Clone)]
pub struct ModelWorker {
    ctx: Arc<WorkerContext>,
}

impl ModelWorker {
    pub fn new(ctx: Arc<WorkerContext>) -> Self {
        Self { ctx }
    }

    /// Extract the model card for `entry` and persist its metadata record.
    ///
    /// Never fails: an unreachable image yields an empty result with no
    /// files written, and any later failure falls back to a skeleton record.
    pub async fn run(&self, entry: &ModelEntry) -> ModelResult {
        let reference = entry.uri.as_str();
        tracing::info!(reference, stage = %Stage::Fetching, "Processing model");

        let image = match self.ctx.fetcher.fetch(reference).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(reference, stage = %Stage::Fetching, error = %e, "Image unreachable");
                return ModelResult::unreachable(reference);
            }
        };

        let timestamps = ImageTimestamps::from_config_blob(&image.config_blob);
        let model_dir = persist::model_dir(&self.ctx.config.output_dir, reference);

        let extracted = self
            .extract_card(&image, &model_dir, reference, timestamps)
            .await;
        drop(image);

        let (found, flags, metadata_path) = match extracted {
            Some(extracted) => (true, extracted.flags, extracted.metadata_path),
            None => {
                let path = self.write_skeleton(&model_dir, reference, timestamps).await;
                (false, ExtractedMetadata::default(), path)
            }
        };

        if !entry.labels.is_empty() {
            match persist::merge_labels(&metadata_path, &entry.labels).await {
                Ok(true) => tracing::info!(reference, labels = ?entry.labels, "Merged labels into tags"),
                Ok(false) => {}
                Err(e) => tracing::warn!(
                    reference,
                    path = %metadata_path.display(),
                    error = %e,
                    "Failed to merge labels"
                ),
            }
        }

        ModelResult {
            reference: reference.to_string(),
            model_card_found: found,
            metadata: flags,
        }
    }

    /// Try each documentation layer in manifest order until one yields a card.
    async fn extract_card(
        &self,
        image: &FetchedImage,
        model_dir: &Path,
        reference: &str,
        timestamps: Timestamps,
    ) -> Option<Extracted> {
        let doc_layer = &self.ctx.config.doc_layer;
        let candidates: Vec<usize> = doc_layer_candidates(&image.layers, doc_layer).collect();

        if candidates.is_empty() {
            tracing::info!(reference, stage = %Stage::Locating, "No model card layer");
            return None;
        }

        for index in candidates {
            let layer = &image.layers[index];
            tracing::info!(
                reference,
                stage = %Stage::Locating,
                digest = %layer.digest,
                "Found model card layer"
            );

            let doc = match self.scan_layer(image, layer, reference).await {
                Some(doc) => doc,
                None => continue,
            };

            match self.persist_card(&doc, model_dir, reference, timestamps).await {
                Ok(extracted) => return Some(extracted),
                Err(e) => {
                    tracing::warn!(
                        reference,
                        stage = %Stage::Extracting,
                        file = %doc.name,
                        error = %e,
                        "Failed to write model card"
                    );
                }
            }
        }

        None
    }

    /// Fetch and scan one layer. Failures are logged and yield `None`.
    async fn scan_layer(
        &self,
        image: &FetchedImage,
        layer: &LayerDescriptor,
        reference: &str,
    ) -> Option<DocFile> {
        let blob = match fetch_blob(
            &*image.session,
            layer,
            self.ctx.config.registry_timeout(),
            &self.ctx.cache,
        )
        .await
        {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(
                    reference,
                    stage = %Stage::Locating,
                    digest = %layer.digest,
                    error = %e,
                    "Failed to fetch model card layer"
                );
                return None;
            }
        };

        tracing::debug!(
            reference,
            stage = %Stage::Decompressing,
            media_type = %layer.media_type,
            size = blob.len(),
            "Scanning model card layer"
        );

        let media_type = layer.media_type.clone();
        let extension = self.ctx.config.doc_layer.extension.clone();
        let scanned = tokio::task::spawn_blocking(move || {
            scan_doc_archive(Cursor::new(blob), &media_type, &extension)
        })
        .await
        .map_err(|e| ModelcarError::ArchiveError(format!("Scan task failed: {}", e)))
        .and_then(|result| result);

        match scanned {
            Ok(Some(doc)) => {
                tracing::info!(
                    reference,
                    stage = %Stage::Scanning,
                    file = %doc.name,
                    size = doc.content.len(),
                    "Found model card"
                );
                Some(doc)
            }
            Ok(None) => {
                tracing::info!(
                    reference,
                    stage = %Stage::Scanning,
                    digest = %layer.digest,
                    "Layer does not hold exactly one model card"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    reference,
                    stage = %Stage::Decompressing,
                    digest = %layer.digest,
                    error = %e,
                    "Unreadable model card layer"
                );
                None
            }
        }
    }

    /// Write the card and its metadata record next to it.
    async fn persist_card(
        &self,
        doc: &DocFile,
        model_dir: &Path,
        reference: &str,
        timestamps: Timestamps,
    ) -> Result<Extracted> {
        let doc_path = persist::write_doc(model_dir, doc).await?;
        tracing::info!(
            reference,
            stage = %Stage::Extracting,
            path = %doc_path.display(),
            "Wrote model card"
        );

        let flags = self.ctx.parser.parse_flags(&doc.content);
        let mut metadata = self.ctx.parser.parse_values(&doc.content);
        metadata.artifacts = self.ctx.artifacts.artifacts_for(reference);
        metadata.apply_timestamps(timestamps);

        let metadata_path = doc_path
            .parent()
            .unwrap_or(model_dir)
            .join(persist::METADATA_FILE);
        if let Err(e) = persist::write_metadata(&metadata_path, &metadata).await {
            tracing::warn!(
                reference,
                path = %metadata_path.display(),
                error = %e,
                "Failed to write metadata record"
            );
        }

        Ok(Extracted {
            flags,
            metadata_path,
        })
    }

    async fn write_skeleton(
        &self,
        model_dir: &Path,
        reference: &str,
        timestamps: Timestamps,
    ) -> PathBuf {
        let mut metadata = ExtractedMetadata::skeleton(self.ctx.artifacts.artifacts_for(reference));
        metadata.apply_timestamps(timestamps);

        let path = persist::skeleton_path(model_dir);
        match persist::write_metadata(&path, &metadata).await {
            Ok(()) => tracing::info!(reference, path = %path.display(), "Wrote skeleton metadata"),
            Err(e) => tracing::warn!(
                reference,
                path = %path.display(),
                error = %e,
                "Failed to write skeleton metadata"
            ),
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Fetching.to_string(), "fetching");
        assert_eq!(Stage::Decompressing.to_string(), "decompressing");
        assert_eq!(Stage::Extracting.to_string(), "extracting");
    }
}
