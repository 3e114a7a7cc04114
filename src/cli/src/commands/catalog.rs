//! `modelcar catalog` command.

use std::path::PathBuf;

use clap::Args;
use modelcar_runtime::catalog::{generate_catalog, DEFAULT_CATALOG_SOURCE};

use super::CatalogOptions;

#[derive(Args)]
pub struct CatalogArgs {
    /// Directory holding extracted metadata
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub catalog: CatalogOptions,
}

pub async fn execute(args: CatalogArgs) -> Result<(), Box<dyn std::error::Error>> {
    let static_paths = args.catalog.static_catalog_paths();
    if static_paths.is_empty() {
        tracing::info!("No static catalog files to process");
    }

    let catalog = generate_catalog(
        args.output_dir,
        args.catalog.catalog_output.clone(),
        static_paths,
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
