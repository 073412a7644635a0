//! Supported output formats

use crate::error::{ProvError, Result};
use std::fmt;
use std::str::FromStr;

/// RDF serialization formats a provenance bundle can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RdfFormat {
    /// Turtle, the default
    #[default]
    Turtle,
    NTriples,
    RdfXml,
    JsonLd,
}

impl RdfFormat {
    pub const ALL: [RdfFormat; 4] = [
        RdfFormat::Turtle,
        RdfFormat::NTriples,
        RdfFormat::RdfXml,
        RdfFormat::JsonLd,
    ];

    /// Resolve a caller-supplied format name
    ///
    /// `None` and empty names select [`RdfFormat::Turtle`]. Names are matched
    /// case-insensitively; unknown names are [`ProvError::UnsupportedFormat`].
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(RdfFormat::default()),
            Some(name) => name.parse(),
        }
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "turtle",
            RdfFormat::NTriples => "ntriples",
            RdfFormat::RdfXml => "xml",
            RdfFormat::JsonLd => "json-ld",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::RdfXml => "application/rdf+xml",
            RdfFormat::JsonLd => "application/ld+json",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            RdfFormat::Turtle => "ttl",
            RdfFormat::NTriples => "nt",
            RdfFormat::RdfXml => "rdf",
            RdfFormat::JsonLd => "jsonld",
        }
    }
}

impl FromStr for RdfFormat {
    type Err = ProvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turtle" | "ttl" | "text/turtle" => Ok(RdfFormat::Turtle),
            "nt" | "ntriples" | "n-triples" | "application/n-triples" => Ok(RdfFormat::NTriples),
            "xml" | "rdfxml" | "rdf/xml" | "pretty-xml" | "application/rdf+xml" => {
                Ok(RdfFormat::RdfXml)
            }
            "json-ld" | "jsonld" | "application/ld+json" => Ok(RdfFormat::JsonLd),
            _ => Err(ProvError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
