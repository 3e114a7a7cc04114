//! Registry sessions for reading modelcar images.
//!
//! [`Registry`] and [`RegistrySession`] are the seam between the extraction
//! pipeline and a container registry. [`OciRegistry`] implements them with the
//! `oci-distribution` crate; tests substitute in-memory registries.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use modelcar_core::error::{ModelcarError, Result};
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::manifest::{ImageIndexEntry, OciImageManifest};
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference};

use super::reference::ImageReference;

/// One layer of an image, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Content digest (e.g., "sha256:abc123...")
    pub digest: String,
    pub media_type: String,
    /// Declared size in bytes
    pub size: u64,
    pub annotations: BTreeMap<String, String>,
}

/// Opens sessions against a registry.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Open a session for one image.
    async fn open(&self, reference: &ImageReference) -> Result<Box<dyn RegistrySession>>;
}

/// A live session bound to one image.
#[async_trait]
pub trait RegistrySession: Send + Sync {
    /// Fetch the image manifest, returning its raw bytes.
    async fn manifest(&mut self) -> Result<Vec<u8>>;

    /// Fetch the image configuration blob. Requires the manifest.
    async fn config_blob(&mut self) -> Result<Vec<u8>>;

    /// Layer descriptors in manifest order. Empty before the manifest is fetched.
    fn layer_infos(&self) -> Vec<LayerDescriptor>;

    /// Fetch a layer blob by digest.
    async fn blob(&self, digest: &str) -> Result<Bytes>;

    /// Release the session. Must be idempotent.
    fn close(&mut self);
}

/// Owns a session and closes it when dropped.
///
/// Dropping happens on every exit path, including timeouts that cancel the
/// future holding the guard.
pub struct SessionGuard {
    inner: Box<dyn RegistrySession>,
}

impl SessionGuard {
    pub fn new(inner: Box<dyn RegistrySession>) -> Self {
        Self { inner }
    }
}

impl Deref for SessionGuard {
    type Target = dyn RegistrySession;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Authentication credentials for a container registry.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Create anonymous authentication (no credentials).
    pub fn anonymous() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    /// Create basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Create authentication from environment variables.
    ///
    /// Reads `REGISTRY_USERNAME` and `REGISTRY_PASSWORD`.
    /// Falls back to anonymous if not set.
    pub fn from_env() -> Self {
        let username = std::env::var("REGISTRY_USERNAME").ok();
        let password = std::env::var("REGISTRY_PASSWORD").ok();

        if username.is_some() && password.is_some() {
            Self { username, password }
        } else {
            Self::anonymous()
        }
    }

    /// Convert to oci-distribution auth type.
    fn to_oci_auth(&self) -> OciRegistryAuth {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => OciRegistryAuth::Basic(u.clone(), p.clone()),
            _ => OciRegistryAuth::Anonymous,
        }
    }
}

/// Registry backed by `oci-distribution`.
pub struct OciRegistry {
    client: Arc<Client>,
    auth: RegistryAuth,
}

impl OciRegistry {
    /// Create a registry client with anonymous authentication.
    pub fn new() -> Self {
        Self::with_auth(RegistryAuth::anonymous())
    }

    /// Create a registry client with the given authentication.
    pub fn with_auth(auth: RegistryAuth) -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            platform_resolver: Some(Box::new(linux_platform_resolver)),
            ..Default::default()
        };

        Self {
            client: Arc::new(Client::new(config)),
            auth,
        }
    }
}

impl Default for OciRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for OciRegistry {
    async fn open(&self, reference: &ImageReference) -> Result<Box<dyn RegistrySession>> {
        let oci_ref = reference.to_oci_reference()?;

        tracing::debug!(reference = %reference, "Opening registry session");

        Ok(Box::new(OciSession {
            client: Arc::clone(&self.client),
            reference: oci_ref,
            registry: reference.registry.clone(),
            auth: self.auth.to_oci_auth(),
            manifest: None,
            closed: false,
        }))
    }
}

/// Session over one image reference.
struct OciSession {
    client: Arc<Client>,
    reference: Reference,
    registry: String,
    auth: OciRegistryAuth,
    manifest: Option<OciImageManifest>,
    closed: bool,
}

impl OciSession {
    fn registry_error(&self, message: String) -> ModelcarError {
        ModelcarError::RegistryError {
            registry: self.registry.clone(),
            message,
        }
    }
}

#[async_trait]
impl RegistrySession for OciSession {
    async fn manifest(&mut self) -> Result<Vec<u8>> {
        // Resolves multi-arch image indexes to a linux platform
        let (image_manifest, digest) = self
            .client
            .pull_image_manifest(&self.reference, &self.auth)
            .await
            .map_err(|e| self.registry_error(format!("Failed to pull manifest: {}", e)))?;

        let raw = serde_json::to_vec(&image_manifest)?;
        tracing::debug!(
            reference = %self.reference,
            digest = %digest,
            size = raw.len(),
            "Pulled image manifest"
        );

        self.manifest = Some(image_manifest);
        Ok(raw)
    }

    async fn config_blob(&mut self) -> Result<Vec<u8>> {
        let descriptor = match &self.manifest {
            Some(manifest) => manifest.config.clone(),
            None => {
                return Err(self.registry_error(
                    "Manifest must be fetched before the config blob".to_string(),
                ))
            }
        };

        let mut config_data: Vec<u8> = Vec::new();
        self.client
            .pull_blob(&self.reference, &descriptor, &mut config_data)
            .await
            .map_err(|e| self.registry_error(format!("Failed to pull config blob: {}", e)))?;

        Ok(config_data)
    }

    fn layer_infos(&self) -> Vec<LayerDescriptor> {
        let Some(manifest) = &self.manifest else {
            return Vec::new();
        };

        manifest
            .layers
            .iter()
            .map(|layer| LayerDescriptor {
                digest: layer.digest.clone(),
                media_type: layer.media_type.clone(),
                size: u64::try_from(layer.size).unwrap_or(0),
                annotations: layer
                    .annotations
                    .iter()
                    .flatten()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect()
    }

    async fn blob(&self, digest: &str) -> Result<Bytes> {
        let descriptor = self
            .manifest
            .as_ref()
            .and_then(|m| m.layers.iter().find(|l| l.digest == digest))
            .ok_or_else(|| self.registry_error(format!("Unknown layer digest {}", digest)))?;

        let mut layer_data: Vec<u8> = Vec::new();
        self.client
            .pull_blob(&self.reference, descriptor, &mut layer_data)
            .await
            .map_err(|e| self.registry_error(format!("Failed to pull layer {}: {}", digest, e)))?;

        Ok(Bytes::from(layer_data))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::debug!(reference = %self.reference, "Closed registry session");
        }
    }
}

/// Platform resolver for multi-arch modelcar indexes.
///
/// Prefers `linux` on the host architecture, then any `linux` entry, since
/// model weights are architecture independent.
fn linux_platform_resolver(manifests: &[ImageIndexEntry]) -> Option<String> {
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };

    let is_linux = |entry: &&ImageIndexEntry| {
        entry.platform.as_ref().map_or(false, |p| p.os == "linux")
    };

    manifests
        .iter()
        .filter(is_linux)
        .find(|entry| {
            entry
                .platform
                .as_ref()
                .map_or(false, |p| p.architecture == arch)
        })
        .or_else(|| manifests.iter().find(is_linux))
        .map(|entry| entry.digest.clone())
}
