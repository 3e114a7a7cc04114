//! On-disk layout of extraction output.
//!
//! ```text
//! <output>/
//! ├── manifests.yaml
//! └── <sanitized reference>/
//!     ├── <doc path from the layer>      e.g. models/README.md
//!     └── <doc parent>/metadata.yaml
//! ```
//!
//! Skeleton records land in `<sanitized reference>/models/metadata.yaml`.

use std::path::{Path, PathBuf};

use modelcar_core::error::Result;
use modelcar_core::metadata::ExtractedMetadata;

use crate::oci::archive::{resolve_within, DocFile};
use crate::oci::reference::sanitize_reference;

/// Per-model metadata record file name.
pub const METADATA_FILE: &str = "metadata.yaml";

/// Sub-directory holding skeleton records.
pub const SKELETON_DIR: &str = "models";

/// Run manifest file name.
pub const MANIFESTS_FILE: &str = "manifests.yaml";

/// Output directory for one model.
pub fn model_dir(output_dir: &Path, reference: &str) -> PathBuf {
    output_dir.join(sanitize_reference(reference))
}

/// Where the skeleton record for a model is written.
pub fn skeleton_path(model_dir: &Path) -> PathBuf {
    model_dir.join(SKELETON_DIR).join(METADATA_FILE)
}

/// Write the documentation file under `model_dir` at its normalized relative path.
///
/// Returns the path written. A relative path that would land outside
/// `model_dir` is rejected with `UnsafePath`.
pub async fn write_doc(model_dir: &Path, doc: &DocFile) -> Result<PathBuf> {
    let path = resolve_within(model_dir, &doc.relative_path.to_string_lossy())?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &doc.content).await?;
    Ok(path)
}

/// Serialize a metadata record to `path`, creating parent directories.
pub async fn write_metadata(path: &Path, metadata: &ExtractedMetadata) -> Result<()> {
    let yaml = serde_yaml::to_string(metadata)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, yaml).await?;
    Ok(())
}

pub async fn read_metadata(path: &Path) -> Result<ExtractedMetadata> {
    let data = tokio::fs::read_to_string(path).await?;
    Ok(serde_yaml::from_str(&data)?)
}

/// Add `labels` to the tags of the record at `path`.
///
/// The file is rewritten only when a new tag was added, so repeated merges
/// of the same labels leave it untouched.
pub async fn merge_labels(path: &Path, labels: &[String]) -> Result<bool> {
    let mut metadata = read_metadata(path).await?;
    if !metadata.merge_labels(labels) {
        return Ok(false);
    }
    write_metadata(path, &metadata).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcar_core::metadata::OciArtifact;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let dir = model_dir(Path::new("/out"), "quay.io/org/model:1.0");
        assert_eq!(dir, PathBuf::from("/out/quay.io_org_model_1.0"));
        assert_eq!(
            skeleton_path(&dir),
            PathBuf::from("/out/quay.io_org_model_1.0/models/metadata.yaml")
        );
    }

    #[tokio::test]
    async fn test_write_doc_keeps_relative_path() {
        let tmp = TempDir::new().unwrap();
        let doc = DocFile {
            name: "./models/README.md".to_string(),
            relative_path: PathBuf::from("models/README.md"),
            content: b"# Card\n".to_vec(),
        };

        let path = write_doc(tmp.path(), &doc).await.unwrap();
        assert_eq!(path, tmp.path().join("models/README.md"));
        assert_eq!(std::fs::read(&path).unwrap(), b"# Card\n");
    }

    #[tokio::test]
    async fn test_write_doc_uses_normalized_path() {
        let tmp = TempDir::new().unwrap();
        let doc = DocFile {
            name: "docs/../models/./README.md".to_string(),
            relative_path: PathBuf::from("models/README.md"),
            content: b"card".to_vec(),
        };

        let path = write_doc(tmp.path(), &doc).await.unwrap();
        assert_eq!(path, tmp.path().join("models/README.md"));
        assert!(!tmp.path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_write_doc_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let doc = DocFile {
            name: "../escape.md".to_string(),
            relative_path: PathBuf::from("../escape.md"),
            content: Vec::new(),
        };
        assert!(write_doc(&tmp.path().join("model"), &doc).await.is_err());
        assert!(!tmp.path().join("escape.md").exists());
    }

    #[tokio::test]
    async fn test_merge_labels_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = skeleton_path(tmp.path());
        let metadata = ExtractedMetadata::skeleton(vec![OciArtifact::new("oci://m:1")]);
        write_metadata(&path, &metadata).await.unwrap();

        let labels = vec!["validated".to_string(), "featured".to_string()];
        assert!(merge_labels(&path, &labels).await.unwrap());
        let before = std::fs::read(&path).unwrap();

        assert!(!merge_labels(&path, &labels).await.unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let merged = read_metadata(&path).await.unwrap();
        assert_eq!(merged.tags, labels);
    }

    #[tokio::test]
    async fn test_merge_labels_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = merge_labels(&tmp.path().join("nope.yaml"), &["x".to_string()]).await;
        assert!(result.is_err());
    }
}
