//! CLI command definitions and dispatch.

mod catalog;
mod extract;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Static catalog picked up automatically when present.
pub const DEFAULT_STATIC_CATALOG: &str = "input/supplemental-catalog.yaml";

/// Modelcar - model card extraction for OCI modelcar images.
#[derive(Parser)]
#[command(name = "modelcar", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Extract model cards for every model in the index, then build the catalog
    Extract(extract::ExtractArgs),
    /// Build the models catalog from an existing output directory
    Catalog(catalog::CatalogArgs),
}

/// Options shared by commands that write the models catalog.
#[derive(Args, Debug, Clone)]
pub struct CatalogOptions {
    /// Path for the generated models catalog
    #[arg(long, default_value = "data/models-catalog.yaml")]
    pub catalog_output: PathBuf,

    /// Comma-separated list of static catalog files to include
    #[arg(long)]
    pub static_catalog_files: Option<String>,

    /// Skip the default input/supplemental-catalog.yaml file
    #[arg(long)]
    pub skip_default_static_catalog: bool,
}

impl CatalogOptions {
    /// Static catalog files to merge, explicit files first.
    pub fn static_catalog_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .static_catalog_files
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .collect();

        if !self.skip_default_static_catalog {
            let default = PathBuf::from(DEFAULT_STATIC_CATALOG);
            if default.exists() {
                paths.push(default);
            }
        }
        paths
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Extract(args) => extract::execute(args).await,
        Command::Catalog(args) => catalog::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(files: Option<&str>) -> CatalogOptions {
        CatalogOptions {
            catalog_output: PathBuf::from("data/models-catalog.yaml"),
            static_catalog_files: files.map(str::to_string),
            skip_default_static_catalog: true,
        }
    }

    #[test]
    fn test_static_catalog_paths_split() {
        let paths = options(Some(" a.yaml, ,b.yaml,")).static_catalog_paths();
        assert_eq!(paths, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
    }

    #[test]
    fn test_static_catalog_paths_empty() {
        assert!(options(None).static_catalog_paths().is_empty());
        assert!(options(Some("")).static_catalog_paths().is_empty());
    }

    #[test]
    fn test_parse_extract_flags() {
        let cli = Cli::try_parse_from([
            "modelcar",
            "extract",
            "--input",
            "index.yaml",
            "--max-concurrent",
            "0",
            "--skip-catalog",
            "--static-catalog-files",
            "x.yaml",
        ])
        .unwrap();

        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.input, PathBuf::from("index.yaml"));
                assert_eq!(args.max_concurrent, Some(0));
                assert!(args.skip_catalog);
                assert_eq!(args.catalog.static_catalog_files.as_deref(), Some("x.yaml"));
            }
            Command::Catalog(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn test_parse_negative_concurrency() {
        let cli =
            Cli::try_parse_from(["modelcar", "extract", "--max-concurrent", "-3"]).unwrap();
        match cli.command {
            Command::Extract(args) => assert_eq!(args.max_concurrent, Some(-3)),
            Command::Catalog(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn test_parse_catalog_defaults() {
        let cli = Cli::try_parse_from(["modelcar", "catalog"]).unwrap();
        match cli.command {
            Command::Catalog(args) => {
                assert_eq!(args.output_dir, PathBuf::from("output"));
                assert_eq!(
                    args.catalog.catalog_output,
                    PathBuf::from("data/models-catalog.yaml")
                );
                assert!(!args.catalog.skip_default_static_catalog);
            }
            Command::Extract(_) => panic!("expected catalog"),
        }
    }
}
