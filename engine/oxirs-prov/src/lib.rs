//! # OxiRS Prov
//!
//! Provenance graphs for data-package pipelines.
//!
//! This crate turns a pipeline specification (`pipeline-spec.yaml`) and the
//! data-package manifest it produced (`datapackage.json`) into a PROV-O /
//! P-PLAN provenance bundle, and renders that bundle as Turtle, N-Triples,
//! RDF/XML or JSON-LD.
//!
//! - [`loader`]: fetches the two source documents from object storage
//! - [`resolver`]: resolves data managers (by ORCID) to agent nodes
//! - [`builder`]: assembles the provenance graph
//! - [`serializer`]: renders the graph in a chosen [`RdfFormat`]
//!
//! ## Examples
//!
//! ```rust,no_run
//! use oxirs_prov::{config::ProvConfig, builder::ProvenanceBuilder};
//!
//! # async fn run() -> oxirs_prov::Result<()> {
//! let config = ProvConfig::load(None)?;
//! let builder = ProvenanceBuilder::from_config(&config)?;
//! let turtle = builder.generate("dataset-123", "1", None).await?;
//! println!("{turtle}");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod graph;
pub mod loader;
pub mod model;
pub mod namespaces;
pub mod resolver;
pub mod serializer;
pub mod value;
pub mod vocab;

pub use builder::ProvenanceBuilder;
pub use error::{ErrorKind, ProvError, Result};
pub use format::RdfFormat;
pub use graph::{NodeKind, ProvGraph};
pub use model::*;
pub use namespaces::Namespaces;

/// Version information for OxiRS Prov
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
