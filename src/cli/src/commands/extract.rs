//! `modelcar extract` command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use modelcar_core::config::{ExtractorConfig, ModelsIndex};
use modelcar_runtime::catalog::{generate_catalog, DEFAULT_CATALOG_SOURCE};
use modelcar_runtime::extract::{extract_models, WorkerContext};
use modelcar_runtime::oci::{OciRegistry, RegistryAuth};

use super::CatalogOptions;

#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the models index YAML file
    #[arg(long, default_value = "data/models-index.yaml")]
    pub input: PathBuf,

    /// Output directory for extracted metadata [default: output]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of models processed at once [default: 5]
    #[arg(long, allow_negative_numbers = true)]
    pub max_concurrent: Option<i64>,

    /// Extraction configuration file (YAML); flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip catalog generation
    #[arg(long)]
    pub skip_catalog: bool,

    #[command(flatten)]
    pub catalog: CatalogOptions,
}

impl ExtractArgs {
    fn extractor_config(&self) -> Result<ExtractorConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::from_file(path)?,
            None => ExtractorConfig::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(max_concurrent) = self.max_concurrent {
            config.max_concurrent = max_concurrent;
        }
        Ok(config)
    }
}

pub async fn execute(args: ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.extractor_config()?;
    let output_dir = config.output_dir.clone();

    tracing::info!(
        input = %args.input.display(),
        output_dir = %output_dir.display(),
        catalog_output = %args.catalog.catalog_output.display(),
        max_concurrent = config.max_concurrent,
        skip_catalog = args.skip_catalog,
        "Starting model metadata collection"
    );

    let index = ModelsIndex::load(&args.input)?;

    let registry = Arc::new(OciRegistry::with_auth(RegistryAuth::from_env()));
    let ctx = Arc::new(WorkerContext::new(config, registry));
    let results = extract_models(ctx, index.models).await?;

    let found = results.iter().filter(|r| r.model_card_found).count();
    println!(
        "Processed {} models ({} with model cards)",
        results.len(),
        found
    );

    if args.skip_catalog {
        return Ok(());
    }

    let catalog = generate_catalog(
        output_dir,
        args.catalog.catalog_output.clone(),
        args.catalog.static_catalog_paths(),
        DEFAULT_CATALOG_SOURCE,
    )
    .await?;
    println!(
        "Wrote {} ({} models)",
        args.catalog.catalog_output.display(),
        catalog.models.len()
    );

    Ok(())
}
