//! OCI artifact records attached to extracted metadata.

use modelcar_core::metadata::OciArtifact;

/// URI scheme for artifacts served from an OCI registry.
pub const OCI_URI_SCHEME: &str = "oci://";

/// Produces the artifact list for an image reference.
pub trait ArtifactSource: Send + Sync {
    fn artifacts_for(&self, reference: &str) -> Vec<OciArtifact>;
}

/// One artifact pointing at the image itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceArtifacts;

impl ArtifactSource for ReferenceArtifacts {
    fn artifacts_for(&self, reference: &str) -> Vec<OciArtifact> {
        let reference = reference.trim();
        let uri = if reference.starts_with(OCI_URI_SCHEME) {
            reference.to_string()
        } else {
            format!("{}{}", OCI_URI_SCHEME, reference)
        };
        vec![OciArtifact::new(uri)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_artifact() {
        let artifacts = ReferenceArtifacts.artifacts_for("quay.io/org/model:1.0");
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].uri, "oci://quay.io/org/model:1.0");
        assert!(artifacts[0].create_time_since_epoch.is_none());
        assert!(artifacts[0].custom_properties.is_empty());
    }

    #[test]
    fn test_existing_scheme_kept() {
        let artifacts = ReferenceArtifacts.artifacts_for("oci://quay.io/org/model:1.0");
        assert_eq!(artifacts[0].uri, "oci://quay.io/org/model:1.0");
    }
}
