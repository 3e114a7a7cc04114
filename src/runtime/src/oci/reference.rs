//! OCI image reference parsing.
//!
//! Parses modelcar references like `registry.redhat.io/rhelai1/modelcar-granite:1.5`
//! into structured components, and derives the per-model output directory name.

use modelcar_core::error::{ModelcarError, Result};
use oci_distribution::Reference;

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when none is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed OCI image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g., "quay.io", "registry.redhat.io")
    pub registry: String,
    /// Repository path (e.g., "rhelai1/modelcar-granite")
    pub repository: String,
    /// Tag (e.g., "latest", "1.5")
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// Supports formats:
    /// - `granite` → docker.io/library/granite:latest
    /// - `org/granite:1.5` → docker.io/org/granite:1.5
    /// - `quay.io/org/granite:1.5` → quay.io/org/granite:1.5
    /// - `quay.io/org/granite@sha256:abc...` → quay.io/org/granite@sha256:abc...
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ModelcarError::InvalidReference(
                "Empty image reference".to_string(),
            ));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(ModelcarError::InvalidReference(format!(
                "Whitespace in image reference '{}'",
                reference
            )));
        }

        // Split off digest first (@ separator)
        let (name_tag, digest) = match reference.rfind('@') {
            Some(at_pos) => {
                let digest_part = &reference[at_pos + 1..];
                if !digest_part.contains(':') {
                    return Err(ModelcarError::InvalidReference(format!(
                        "Invalid digest format in reference '{}': expected algorithm:hex",
                        reference
                    )));
                }
                (&reference[..at_pos], Some(digest_part.to_string()))
            }
            None => (reference, None),
        };

        let (name, tag) = Self::split_tag(name_tag);
        if tag.as_deref() == Some("") {
            return Err(ModelcarError::InvalidReference(format!(
                "Empty tag in reference '{}'",
                reference
            )));
        }

        let (registry, repository) = Self::split_registry_repository(&name)?;

        // Apply default tag if no tag and no digest
        let tag = if tag.is_none() && digest.is_none() {
            Some(DEFAULT_TAG.to_string())
        } else {
            tag
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Split `name[:tag]`, only looking for the tag after the last `/`.
    fn split_tag(name_tag: &str) -> (String, Option<String>) {
        if let Some(slash_pos) = name_tag.rfind('/') {
            let after_slash = &name_tag[slash_pos + 1..];
            return match after_slash.rfind(':') {
                Some(colon_pos) => (
                    name_tag[..slash_pos + 1 + colon_pos].to_string(),
                    Some(after_slash[colon_pos + 1..].to_string()),
                ),
                None => (name_tag.to_string(), None),
            };
        }

        match name_tag.rfind(':') {
            // registry:port with no repository is not a tag
            Some(colon_pos)
                if name_tag[colon_pos + 1..].chars().all(|c| c.is_ascii_digit())
                    && colon_pos + 1 < name_tag.len() =>
            {
                (name_tag.to_string(), None)
            }
            Some(colon_pos) => (
                name_tag[..colon_pos].to_string(),
                Some(name_tag[colon_pos + 1..].to_string()),
            ),
            None => (name_tag.to_string(), None),
        }
    }

    /// Split a name into registry and repository components.
    fn split_registry_repository(name: &str) -> Result<(String, String)> {
        if name.is_empty() {
            return Err(ModelcarError::InvalidReference(
                "Empty repository name".to_string(),
            ));
        }

        // The first component is a registry if it looks like a hostname
        if let Some(slash_pos) = name.find('/') {
            let first = &name[..slash_pos];
            if first.contains('.') || first.contains(':') || first == "localhost" {
                let repo = &name[slash_pos + 1..];
                if repo.is_empty() {
                    return Err(ModelcarError::InvalidReference(format!(
                        "Empty repository in reference '{}'",
                        name
                    )));
                }
                return Ok((first.to_string(), repo.to_string()));
            }
        }

        let repository = if name.contains('/') {
            name.to_string()
        } else {
            format!("library/{}", name)
        };

        Ok((DEFAULT_REGISTRY.to_string(), repository))
    }

    /// Get the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }

    /// Convert to an oci-distribution reference.
    pub fn to_oci_reference(&self) -> Result<Reference> {
        let full = self.full_reference();
        full.parse::<Reference>().map_err(|e| {
            ModelcarError::InvalidReference(format!("Invalid OCI reference '{}': {}", full, e))
        })
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

/// Directory name for a model's extracted files.
///
/// Every character outside `[A-Za-z0-9._-]` becomes `_`, so
/// `quay.io/org/model:1.0` maps to `quay.io_org_model_1.0`. A result made
/// only of dots is replaced by underscores so it can never name `.` or `..`.
pub fn sanitize_reference(reference: &str) -> String {
    let sanitized: String = reference
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return "_".repeat(sanitized.len().max(1));
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let r = ImageReference::parse("granite").unwrap();
        assert_eq!(r.registry, "docker.io");
        assert_eq!(r.repository, "library/granite");
        assert_eq!(r.tag, Some("latest".to_string()));
        assert_eq!(r.digest, None);
    }

    #[test]
    fn test_parse_user_repo_with_tag() {
        let r = ImageReference::parse("org/granite:1.5").unwrap();
        assert_eq!(r.registry, "docker.io");
        assert_eq!(r.repository, "org/granite");
        assert_eq!(r.tag, Some("1.5".to_string()));
    }

    #[test]
    fn test_parse_custom_registry() {
        let r = ImageReference::parse("registry.redhat.io/rhelai1/modelcar-granite:1.5").unwrap();
        assert_eq!(r.registry, "registry.redhat.io");
        assert_eq!(r.repository, "rhelai1/modelcar-granite");
        assert_eq!(r.tag, Some("1.5".to_string()));
    }

    #[test]
    fn test_parse_custom_registry_no_tag() {
        let r = ImageReference::parse("quay.io/org/model").unwrap();
        assert_eq!(r.registry, "quay.io");
        assert_eq!(r.repository, "org/model");
        assert_eq!(r.tag, Some("latest".to_string()));
    }

    #[test]
    fn test_parse_digest_only() {
        let r = ImageReference::parse(
            "quay.io/org/model@sha256:abcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890",
        )
        .unwrap();
        assert_eq!(r.registry, "quay.io");
        assert_eq!(r.repository, "org/model");
        assert_eq!(r.tag, None);
        assert!(r.digest.unwrap().starts_with("sha256:"));
    }

    #[test]
    fn test_parse_tag_and_digest() {
        let r = ImageReference::parse("quay.io/org/model:1.0@sha256:abcdef1234567890").unwrap();
        assert_eq!(r.tag, Some("1.0".to_string()));
        assert_eq!(r.digest, Some("sha256:abcdef1234567890".to_string()));
    }

    #[test]
    fn test_parse_registry_with_port() {
        let r = ImageReference::parse("myregistry.io:5000/model:v1").unwrap();
        assert_eq!(r.registry, "myregistry.io:5000");
        assert_eq!(r.repository, "model");
        assert_eq!(r.tag, Some("v1".to_string()));
    }

    #[test]
    fn test_parse_localhost_registry() {
        let r = ImageReference::parse("localhost/model:test").unwrap();
        assert_eq!(r.registry, "localhost");
        assert_eq!(r.repository, "model");
    }

    #[test]
    fn test_parse_malformed_references() {
        assert!(ImageReference::parse("").is_err());
        assert!(ImageReference::parse("   ").is_err());
        assert!(ImageReference::parse("model@invaliddigest").is_err());
        assert!(ImageReference::parse("quay.io/").is_err());
        assert!(ImageReference::parse("quay.io/org/model:").is_err());
        assert!(ImageReference::parse("quay.io/org model:1").is_err());
    }

    #[test]
    fn test_parse_error_kind() {
        let err = ImageReference::parse("").unwrap_err();
        assert!(matches!(err, ModelcarError::InvalidReference(_)));
    }

    #[test]
    fn test_display() {
        let r = ImageReference::parse("granite:1.5").unwrap();
        assert_eq!(format!("{}", r), "docker.io/library/granite:1.5");
    }

    #[test]
    fn test_to_oci_reference_with_tag() {
        let r = ImageReference::parse("quay.io/org/model:1.0").unwrap();
        let oci_ref = r.to_oci_reference().unwrap();
        assert_eq!(oci_ref.to_string(), "quay.io/org/model:1.0");
    }

    #[test]
    fn test_sanitize_reference() {
        assert_eq!(
            sanitize_reference("registry.example.com/test/model:latest"),
            "registry.example.com_test_model_latest"
        );
        assert_eq!(
            sanitize_reference("quay.io/org/model@sha256:abc"),
            "quay.io_org_model_sha256_abc"
        );
    }

    #[test]
    fn test_sanitize_reference_never_traverses() {
        assert_eq!(sanitize_reference(".."), "__");
        assert_eq!(sanitize_reference("."), "_");
        assert_eq!(sanitize_reference(""), "_");
        assert_eq!(sanitize_reference("../../etc"), ".._.._etc");
        assert!(!sanitize_reference("../../etc").contains('/'));
    }
}
