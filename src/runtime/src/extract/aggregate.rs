//! Run manifest output.

use std::path::{Path, PathBuf};

use modelcar_core::error::Result;
use modelcar_core::manifest::{ManifestsData, ModelResult};

use super::persist::MANIFESTS_FILE;

/// Write `manifests.yaml` for a completed run, in result arrival order.
pub async fn write_manifest(results: &[ModelResult], output_dir: &Path) -> Result<PathBuf> {
    let manifests = ManifestsData::from_results(results);
    let yaml = serde_yaml::to_string(&manifests)?;

    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(MANIFESTS_FILE);
    tokio::fs::write(&path, yaml).await?;

    tracing::info!(
        path = %path.display(),
        models = results.len(),
        found = results.iter().filter(|r| r.model_card_found).count(),
        "Wrote manifest"
    );
    Ok(path)
}
