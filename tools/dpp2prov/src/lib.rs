//! # dpp2prov
//!
//! Command-line interface and HTTP service producing PROV-O provenance for
//! data-package pipeline runs.
//!
//! ## Commands
//!
//! - `convert`: build the provenance of one dataset version and print or save it
//! - `serve`: answer `GET /prov` requests over HTTP
//!
//! ## Quick Start
//!
//! ```bash
//! # Render the provenance of version 1 of dataset 123 as Turtle
//! dpp2prov convert --dataset-id 123 --version-id 1
//!
//! # Same dataset, RDF/XML, written to a file
//! dpp2prov convert --dataset-id 123 --version-id 1 --rdf-format xml -o prov.rdf
//!
//! # Same dataset, N-Triples, written to out/123-1.nt
//! dpp2prov convert --dataset-id 123 --version-id 1 --rdf-format nt -o out/
//!
//! # Serve requests on port 8080
//! dpp2prov serve --port 8080
//! ```
//!
//! Configuration is read from `dpp2prov.toml` (or `--config`) and `DPP2PROV_*`
//! environment variables; see [`oxirs_prov::config::ProvConfig`].

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oxirs_prov::config::ProvConfig;
use oxirs_prov::ProvenanceBuilder;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod logging;
pub mod server;

/// dpp2prov CLI application
#[derive(Debug, Parser)]
#[command(name = "dpp2prov")]
#[command(about = "Provenance for data-package pipelines")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the provenance of one dataset version
    Convert {
        /// Dataset identifier
        #[arg(long)]
        dataset_id: String,
        /// Version identifier
        #[arg(long)]
        version_id: String,
        /// Output format (turtle, nt, xml, json-ld); defaults to the configured format
        #[arg(short = 'f', long)]
        rdf_format: Option<String>,
        /// Output file, or a directory to write `{dataset}-{version}.{ext}` into;
        /// standard output when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve provenance over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Convert {
            dataset_id,
            version_id,
            rdf_format,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let builder = ProvenanceBuilder::from_config(&config)
                .context("Failed to configure provenance builder")?;
            convert(
                &builder,
                &dataset_id,
                &version_id,
                rdf_format.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Commands::Serve { host, port } => {
            let configured = load_config(cli.config.as_deref()).and_then(|config| {
                ProvenanceBuilder::from_config(&config).map_err(anyhow::Error::from)
            });
            let state = match configured {
                Ok(builder) => server::AppState::new(builder),
                Err(e) => {
                    warn!("Serving without a usable configuration: {:#}", e);
                    server::AppState::unconfigured(format!("{:#}", e))
                }
            };
            let paused = std::env::var_os(server::PAUSE_VAR).is_some();
            if paused {
                warn!("{} is set; provenance requests will be refused", server::PAUSE_VAR);
            }
            server::serve(state.with_paused(paused), &host, port).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ProvConfig> {
    ProvConfig::load(path).context("Failed to load configuration")
}

/// Generate provenance and write it to `output`, or standard output
///
/// When `output` is an existing directory the file is named after the dataset
/// version and the format's extension.
pub async fn convert(
    builder: &ProvenanceBuilder,
    dataset_id: &str,
    version_id: &str,
    rdf_format: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let context = || format!("Failed to generate provenance for {}:{}", dataset_id, version_id);
    let format = builder.resolve_format(rdf_format).with_context(context)?;
    let prov = builder
        .generate(dataset_id, version_id, Some(format.name()))
        .await
        .with_context(context)?;

    match output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(format!(
                    "{}-{}.{}",
                    dataset_id,
                    version_id,
                    format.file_extension()
                ))
            } else {
                path.to_path_buf()
            };
            let path = path.as_path();
            tokio::fs::write(path, prov.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote provenance to {}", path.display());
        }
        None => print!("{}", prov),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clap::CommandFactory;
    use oxirs_prov::loader::{Document, MemoryDocumentLoader};
    use oxirs_prov::resolver::{IdentityResolver, StaticIdentityLookup};
    use oxirs_prov::NamedNode;
    use std::sync::Arc;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from([
            "dpp2prov",
            "-v",
            "convert",
            "--dataset-id",
            "123",
            "--version-id",
            "1",
            "-f",
            "nt",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Convert {
                dataset_id,
                version_id,
                rdf_format,
                output,
            } => {
                assert_eq!(dataset_id, "123");
                assert_eq!(version_id, "1");
                assert_eq!(rdf_format.as_deref(), Some("nt"));
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["dpp2prov", "serve", "--config", "prov.toml"]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("prov.toml")));
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_convert_writes_output_file() {
        let when = Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap();
        let loader = MemoryDocumentLoader::new()
            .with_document(
                "bucket",
                "ds/1/data/pipeline-spec.yaml",
                Document::new("demo:\n  title: T\n  description: D\n  pipeline: []\n", when),
            )
            .with_document(
                "bucket",
                "ds/1/data/datapackage.json",
                Document::new(r#"{"resources": []}"#, when),
            );
        let builder = ProvenanceBuilder::new(
            Arc::new(loader),
            IdentityResolver::new(Arc::new(StaticIdentityLookup::new())),
            "bucket",
            NamedNode::new("http://lod.bco-dmo.org/id/affiliation/191").unwrap(),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prov.nt");
        convert(&builder, "ds", "1", Some("nt"), Some(&path))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<http://www.w3.org/ns/prov#Bundle>"));

        convert(&builder, "ds", "1", Some("xml"), Some(dir.path()))
            .await
            .unwrap();
        let named = std::fs::read_to_string(dir.path().join("ds-1.rdf")).unwrap();
        assert!(named.contains("<rdf:RDF"));

        let err = convert(&builder, "missing", "1", None, Some(&path))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing:1"));
    }
}
