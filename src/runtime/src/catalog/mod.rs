//! Models catalog generation.
//!
//! Collects every `metadata.yaml` under the extraction output directory,
//! converts the records to catalog form, merges in hand-maintained static
//! catalogs and writes one catalog file sorted by model name.

pub mod logo;
pub mod types;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use modelcar_core::error::{ModelcarError, Result};
use modelcar_core::metadata::{ExtractedMetadata, MetadataValue};

use crate::extract::persist::METADATA_FILE;

pub use logo::logo_for_tags;
pub use types::{CatalogMetadata, CatalogOciArtifact, ModelsCatalog};

/// Source name written into generated catalogs.
pub const DEFAULT_CATALOG_SOURCE: &str = "Red Hat";

/// Every parseable metadata record below `output_dir`, in path order.
///
/// Unreadable or malformed files are skipped with a warning.
pub fn collect_metadata(output_dir: &Path) -> Result<Vec<ExtractedMetadata>> {
    let mut paths = Vec::new();
    find_metadata_files(output_dir, &mut paths)?;

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::debug!(path = %path.display(), "Processing metadata record");
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read metadata record");
                continue;
            }
        };
        match serde_yaml::from_str::<ExtractedMetadata>(&data) {
            Ok(metadata) => records.push(metadata),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse metadata record")
            }
        }
    }
    Ok(records)
}

fn find_metadata_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| {
            ModelcarError::CatalogError(format!("Failed to read {}: {}", dir.display(), e))
        })?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            find_metadata_files(&path, found)?;
        } else if entry.file_name() == METADATA_FILE {
            found.push(path);
        }
    }
    Ok(())
}

/// Convert an extracted record to its catalog form.
///
/// Model-level timestamps fall back to the first artifact's. Tags become
/// string custom properties with empty values.
pub fn to_catalog_metadata(model: ExtractedMetadata) -> CatalogMetadata {
    let first = model.artifacts.first();
    let create_time = model
        .create_time_since_epoch
        .or_else(|| first.and_then(|a| a.create_time_since_epoch));
    let update_time = model
        .last_update_time_since_epoch
        .or_else(|| first.and_then(|a| a.last_update_time_since_epoch));

    let artifacts = model
        .artifacts
        .iter()
        .map(|artifact| CatalogOciArtifact {
            uri: artifact.uri.clone(),
            create_time_since_epoch: artifact.create_time_since_epoch.map(|t| t.to_string()),
            last_update_time_since_epoch: artifact
                .last_update_time_since_epoch
                .map(|t| t.to_string()),
            custom_properties: artifact.custom_properties.clone(),
        })
        .collect();

    CatalogMetadata {
        logo: Some(logo_for_tags(&model.tags)),
        custom_properties: tags_to_custom_properties(&model.tags),
        name: model.name,
        provider: model.provider,
        description: model.description,
        readme: model.readme,
        language: model.language,
        license: model.license,
        license_link: model.license_link,
        tasks: model.tasks,
        create_time_since_epoch: create_time.map(|t| t.to_string()),
        last_update_time_since_epoch: update_time.map(|t| t.to_string()),
        artifacts,
    }
}

fn tags_to_custom_properties(tags: &[String]) -> BTreeMap<String, MetadataValue> {
    tags.iter()
        .filter(|tag| !tag.is_empty())
        .map(|tag| (tag.clone(), MetadataValue::string("")))
        .collect()
}

/// Check the structure of a static catalog.
pub fn validate_static_catalog(catalog: &ModelsCatalog) -> Result<()> {
    if catalog.source.is_empty() {
        return Err(ModelcarError::CatalogError(
            "static catalog missing required 'source' field".to_string(),
        ));
    }

    for (i, model) in catalog.models.iter().enumerate() {
        let name = match model.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(ModelcarError::CatalogError(format!(
                    "model at index {} missing required 'name' field",
                    i
                )))
            }
        };

        if model.artifacts.is_empty() {
            return Err(ModelcarError::CatalogError(format!(
                "model '{}' has no artifacts",
                name
            )));
        }

        if let Some(j) = model.artifacts.iter().position(|a| a.uri.is_empty()) {
            return Err(ModelcarError::CatalogError(format!(
                "model '{}' artifact at index {} missing required 'uri' field",
                name, j
            )));
        }
    }

    Ok(())
}

/// Load and validate static catalog files.
///
/// Missing, unreadable and invalid files are skipped with a warning.
pub fn load_static_catalogs<P: AsRef<Path>>(paths: &[P]) -> Vec<CatalogMetadata> {
    let mut models = Vec::new();

    for path in paths {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Loading static catalog");

        if !path.exists() {
            tracing::warn!(path = %path.display(), "Static catalog file not found");
            continue;
        }

        let catalog = std::fs::read_to_string(path)
            .map_err(ModelcarError::from)
            .and_then(|data| Ok(serde_yaml::from_str::<ModelsCatalog>(&data)?))
            .and_then(|catalog| validate_static_catalog(&catalog).map(|()| catalog));

        match catalog {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    models = catalog.models.len(),
                    "Loaded static catalog"
                );
                models.extend(catalog.models);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping static catalog")
            }
        }
    }

    tracing::info!(models = models.len(), "Static models loaded");
    models
}

fn normalized_name(model: &CatalogMetadata) -> Option<String> {
    let name = model.name.as_deref()?.trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Merge static models into dynamic ones.
///
/// Names compare case-insensitively after trimming. Dynamic models always
/// survive; a static model is kept only if no earlier model has its name.
/// Static models without a name are dropped.
pub fn deduplicate(
    dynamic: Vec<CatalogMetadata>,
    static_models: Vec<CatalogMetadata>,
) -> Vec<CatalogMetadata> {
    let mut seen: HashSet<String> = dynamic.iter().filter_map(normalized_name).collect();
    let mut merged = dynamic;

    for model in static_models {
        let Some(key) = normalized_name(&model) else {
            continue;
        };
        if seen.insert(key) {
            merged.push(model);
        } else {
            tracing::info!(
                name = model.name.as_deref().unwrap_or_default(),
                "Skipping duplicate static model"
            );
        }
    }

    merged
}

fn sort_by_name(models: &mut [CatalogMetadata]) {
    models.sort_by(|a, b| {
        a.name
            .as_deref()
            .unwrap_or_default()
            .cmp(b.name.as_deref().unwrap_or_default())
    });
}

/// Load `static_paths` and run [`create_catalog`] on the blocking pool.
///
/// Catalog generation walks the output tree with synchronous file I/O.
pub async fn generate_catalog(
    output_dir: PathBuf,
    catalog_path: PathBuf,
    static_paths: Vec<PathBuf>,
    source: &str,
) -> Result<ModelsCatalog> {
    let source = source.to_string();
    tokio::task::spawn_blocking(move || {
        let static_models = load_static_catalogs(&static_paths);
        create_catalog(&output_dir, &catalog_path, static_models, &source)
    })
    .await
    .map_err(|e| ModelcarError::CatalogError(format!("Catalog task failed: {}", e)))?
}

/// Build the catalog from `output_dir` and `static_models`, and write it to `catalog_path`.
pub fn create_catalog(
    output_dir: &Path,
    catalog_path: &Path,
    static_models: Vec<CatalogMetadata>,
    source: &str,
) -> Result<ModelsCatalog> {
    let mut records = collect_metadata(output_dir)?;
    records.sort_by(|a, b| {
        a.name
            .as_deref()
            .unwrap_or_default()
            .cmp(b.name.as_deref().unwrap_or_default())
    });

    let dynamic_count = records.len();
    let static_count = static_models.len();
    let dynamic: Vec<CatalogMetadata> = records.into_iter().map(to_catalog_metadata).collect();

    let mut models = deduplicate(dynamic, static_models);
    sort_by_name(&mut models);

    let catalog = ModelsCatalog {
        source: source.to_string(),
        models,
    };

    let yaml = serde_yaml::to_string(&catalog)?;
    if let Some(parent) = catalog_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(catalog_path, yaml)?;

    tracing::info!(
        path = %catalog_path.display(),
        dynamic = dynamic_count,
        static_models = static_count,
        total = catalog.models.len(),
        "Wrote models catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelcar_core::metadata::OciArtifact;
    use tempfile::TempDir;

    fn write_record(root: &Path, rel: &str, metadata: &ExtractedMetadata) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_yaml::to_string(metadata).unwrap()).unwrap();
    }

    fn named(name: &str) -> CatalogMetadata {
        CatalogMetadata {
            name: Some(name.to_string()),
            artifacts: vec![CatalogOciArtifact {
                uri: format!("oci://{}", name),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn record(name: &str, tags: &[&str]) -> ExtractedMetadata {
        ExtractedMetadata {
            name: Some(name.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_catalog_sorted() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("output");
        write_record(&output, "b/models/metadata.yaml", &record("Test Model 2", &[]));
        write_record(&output, "a/models/metadata.yaml", &record("Test Model 3", &[]));
        write_record(
            &output,
            "c/models/metadata.yaml",
            &record("Test Model 1", &["validated", "featured"]),
        );
        std::fs::write(output.join("a/models/README.md"), "# x").unwrap();

        let catalog_path = tmp.path().join("data/models-catalog.yaml");
        let catalog = create_catalog(&output, &catalog_path, Vec::new(), DEFAULT_CATALOG_SOURCE)
            .unwrap();

        let names: Vec<_> = catalog.models.iter().map(|m| m.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["Test Model 1", "Test Model 2", "Test Model 3"]);
        assert!(catalog.models[0].custom_properties.contains_key("validated"));

        let written: ModelsCatalog =
            serde_yaml::from_str(&std::fs::read_to_string(&catalog_path).unwrap()).unwrap();
        assert_eq!(written.source, "Red Hat");
        assert_eq!(written.models.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_catalog_skips_missing_static_file() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("output");
        write_record(&output, "a/models/metadata.yaml", &record("Granite", &[]));
        let catalog_path = tmp.path().join("catalog.yaml");

        let catalog = generate_catalog(
            output,
            catalog_path.clone(),
            vec![tmp.path().join("missing-supplemental.yaml")],
            DEFAULT_CATALOG_SOURCE,
        )
        .await
        .unwrap();

        assert_eq!(catalog.models.len(), 1);
        assert_eq!(catalog.models[0].name.as_deref(), Some("Granite"));
        assert!(catalog_path.exists());
    }

    #[test]
    fn test_create_catalog_empty_output() {
        let tmp = TempDir::new().unwrap();
        let catalog_path = tmp.path().join("catalog.yaml");
        let catalog =
            create_catalog(tmp.path(), &catalog_path, Vec::new(), DEFAULT_CATALOG_SOURCE).unwrap();
        assert!(catalog.models.is_empty());
        assert!(catalog_path.exists());
    }

    #[test]
    fn test_create_catalog_missing_output_dir() {
        let tmp = TempDir::new().unwrap();
        let result = create_catalog(
            &tmp.path().join("missing"),
            &tmp.path().join("catalog.yaml"),
            Vec::new(),
            DEFAULT_CATALOG_SOURCE,
        );
        assert!(matches!(result, Err(ModelcarError::CatalogError(_))));
    }

    #[test]
    fn test_malformed_record_skipped() {
        let tmp = TempDir::new().unwrap();
        write_record(tmp.path(), "ok/models/metadata.yaml", &record("ok", &[]));
        let bad = tmp.path().join("bad/models");
        std::fs::create_dir_all(&bad).unwrap();
        std::fs::write(bad.join("metadata.yaml"), "tags: [unclosed").unwrap();

        let records = collect_metadata(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("ok"));
    }

    #[test]
    fn test_to_catalog_metadata_timestamps_fall_back_to_artifact() {
        let mut artifact = OciArtifact::new("oci://quay.io/m:1");
        artifact.create_time_since_epoch = Some(1705312800000);
        artifact.last_update_time_since_epoch = Some(1706745600123);

        let model = ExtractedMetadata {
            name: Some("m".to_string()),
            tags: vec!["featured".to_string(), String::new()],
            artifacts: vec![artifact],
            ..Default::default()
        };

        let catalog = to_catalog_metadata(model);
        assert_eq!(catalog.create_time_since_epoch.as_deref(), Some("1705312800000"));
        assert_eq!(
            catalog.last_update_time_since_epoch.as_deref(),
            Some("1706745600123")
        );
        assert_eq!(
            catalog.artifacts[0].create_time_since_epoch.as_deref(),
            Some("1705312800000")
        );
        assert_eq!(catalog.custom_properties.len(), 1);
        assert_eq!(
            catalog.custom_properties["featured"],
            MetadataValue::string("")
        );
        assert_eq!(catalog.logo, Some(logo_for_tags::<&str>(&[])));
    }

    #[test]
    fn test_validate_static_catalog() {
        let valid = ModelsCatalog {
            source: "Partner".to_string(),
            models: vec![named("a")],
        };
        assert!(validate_static_catalog(&valid).is_ok());

        let no_source = ModelsCatalog {
            source: String::new(),
            ..valid.clone()
        };
        assert!(validate_static_catalog(&no_source).is_err());

        let mut no_name = valid.clone();
        no_name.models[0].name = None;
        assert!(validate_static_catalog(&no_name).is_err());

        let mut no_artifacts = valid.clone();
        no_artifacts.models[0].artifacts.clear();
        let err = validate_static_catalog(&no_artifacts).unwrap_err();
        assert!(err.to_string().contains("model 'a' has no artifacts"));

        let mut no_uri = valid;
        no_uri.models[0].artifacts[0].uri.clear();
        let err = validate_static_catalog(&no_uri).unwrap_err();
        assert!(err.to_string().contains("missing required 'uri' field"));
    }

    #[test]
    fn test_load_static_catalogs_skips_invalid() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.yaml");
        let bad = tmp.path().join("bad.yaml");
        std::fs::write(
            &good,
            "source: Partner\nmodels:\n  - name: static-model\n    artifacts:\n      - uri: oci://quay.io/s:1\n",
        )
        .unwrap();
        std::fs::write(&bad, "models:\n  - name: nameless-source\n").unwrap();

        let models = load_static_catalogs(&[good, bad, tmp.path().join("missing.yaml")]);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name.as_deref(), Some("static-model"));
    }

    #[test]
    fn test_deduplicate_dynamic_wins() {
        let mut dynamic_model = named("Granite");
        dynamic_model.provider = Some("dynamic".to_string());
        let mut static_model = named("  granite ");
        static_model.provider = Some("static".to_string());

        let merged = deduplicate(
            vec![dynamic_model],
            vec![static_model, named("Other"), named("OTHER"), CatalogMetadata::default()],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].provider.as_deref(), Some("dynamic"));
        assert_eq!(merged[1].name.as_deref(), Some("Other"));
    }

    #[test]
    fn test_create_catalog_merges_static() {
        let tmp = TempDir::new().unwrap();
        write_record(tmp.path(), "z/models/metadata.yaml", &record("Zeta", &[]));

        let catalog = create_catalog(
            tmp.path(),
            &tmp.path().join("catalog.yaml"),
            vec![named("alpha"), named("zeta")],
            DEFAULT_CATALOG_SOURCE,
        )
        .unwrap();

        let names: Vec<_> = catalog.models.iter().map(|m| m.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["Zeta", "alpha"]);
    }
}
