//! Locates the model card layer and fetches its blob.

use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use modelcar_core::config::DocLayerConfig;
use modelcar_core::error::{ModelcarError, Result};

use super::registry::{LayerDescriptor, RegistrySession};

/// Whether `layer` carries the documentation annotation.
pub fn is_doc_layer(layer: &LayerDescriptor, config: &DocLayerConfig) -> bool {
    layer
        .annotations
        .get(&config.annotation_key)
        .map_or(false, |value| *value == config.annotation_value)
}

/// Index of the first documentation layer, if any.
pub fn locate_doc_layer(layers: &[LayerDescriptor], config: &DocLayerConfig) -> Option<usize> {
    layers.iter().position(|layer| is_doc_layer(layer, config))
}

/// Indices of every documentation layer, in manifest order.
pub fn doc_layer_candidates<'a>(
    layers: &'a [LayerDescriptor],
    config: &'a DocLayerConfig,
) -> impl Iterator<Item = usize> + 'a {
    layers
        .iter()
        .enumerate()
        .filter(move |(_, layer)| is_doc_layer(layer, config))
        .map(|(i, _)| i)
}

/// Run-wide blob cache keyed by content digest.
#[derive(Default)]
pub struct BlobCache {
    blobs: DashMap<String, Bytes>,
}

impl BlobCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, digest: &str) -> Option<Bytes> {
        self.blobs.get(digest).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, digest: &str, blob: Bytes) {
        self.blobs.insert(digest.to_string(), blob);
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// Fetch a layer blob, consulting the cache first.
///
/// Each registry call gets its own `timeout`.
pub async fn fetch_blob(
    session: &dyn RegistrySession,
    layer: &LayerDescriptor,
    timeout: Duration,
    cache: &BlobCache,
) -> Result<Bytes> {
    if let Some(blob) = cache.get(&layer.digest) {
        tracing::debug!(digest = %layer.digest, "Blob cache hit");
        return Ok(blob);
    }

    let blob = match tokio::time::timeout(timeout, session.blob(&layer.digest)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ModelcarError::Timeout(format!(
                "Fetching blob {} exceeded {}s",
                layer.digest,
                timeout.as_secs()
            )))
        }
    };

    tracing::debug!(digest = %layer.digest, size = blob.len(), "Fetched layer blob");
    cache.insert(&layer.digest, blob.clone());
    Ok(blob)
}
