//! Resolves one image reference into a live session, its layers and its config blob.

use std::sync::Arc;
use std::time::Duration;

use modelcar_core::error::{ModelcarError, Result};

use super::reference::ImageReference;
use super::registry::{LayerDescriptor, Registry, SessionGuard};

/// An image whose manifest and configuration have been retrieved.
///
/// Owns the registry session; dropping it releases the session.
pub struct FetchedImage {
    pub session: SessionGuard,
    pub layers: Vec<LayerDescriptor>,
    pub config_blob: Vec<u8>,
}

/// Fetches image manifests and configuration through a [`Registry`].
#[derive(Clone)]
pub struct ImageFetcher {
    registry: Arc<dyn Registry>,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(registry: Arc<dyn Registry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Parse `raw` and fetch its manifest, layer list and config blob.
    ///
    /// The whole sequence shares one time budget. On any failure the
    /// partially opened session is released before returning.
    pub async fn fetch(&self, raw: &str) -> Result<FetchedImage> {
        let reference = ImageReference::parse(raw)?;

        match tokio::time::timeout(self.timeout, self.fetch_parsed(&reference)).await {
            Ok(result) => result,
            Err(_) => Err(ModelcarError::Timeout(format!(
                "Fetching {} exceeded {}s",
                reference,
                self.timeout.as_secs()
            ))),
        }
    }

    async fn fetch_parsed(&self, reference: &ImageReference) -> Result<FetchedImage> {
        let mut session = SessionGuard::new(self.registry.open(reference).await?);

        let manifest = session.manifest().await?;
        tracing::info!(
            reference = %reference,
            manifest_size = manifest.len(),
            "Fetched manifest"
        );

        let config_blob = session.config_blob().await?;
        let layers = session.layer_infos();

        tracing::info!(
            reference = %reference,
            config_size = config_blob.len(),
            layers = layers.len(),
            "Fetched image configuration"
        );
        for (i, layer) in layers.iter().enumerate() {
            tracing::debug!(
                index = i + 1,
                digest = %layer.digest,
                media_type = %layer.media_type,
                size = layer.size,
                annotations = ?layer.annotations,
                "Layer"
            );
        }

        Ok(FetchedImage {
            session,
            layers,
            config_blob,
        })
    }
}
