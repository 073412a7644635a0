//! Serialization of provenance graphs
//!
//! [`serialize`] dispatches on the closed [`RdfFormat`] enumeration. The graph
//! is only borrowed, so a failed call leaves it ready for another attempt.

mod jsonld;
mod ntriples;
mod rdfxml;
mod turtle;

pub use jsonld::JsonLdSerializer;
pub use ntriples::NTriplesSerializer;
pub use rdfxml::RdfXmlSerializer;
pub use turtle::TurtleSerializer;

use crate::error::{ProvError, Result};
use crate::format::RdfFormat;
use crate::graph::ProvGraph;
use std::io::Write;

/// A serializer for whole provenance graphs
pub trait GraphSerializer {
    /// Serialize to a writer
    fn serialize_graph<W: Write>(&self, graph: &ProvGraph, writer: W) -> Result<()>;

    /// Serialize to a string
    fn serialize_to_string(&self, graph: &ProvGraph) -> Result<String> {
        let mut buffer = Vec::new();
        self.serialize_graph(graph, &mut buffer)?;
        String::from_utf8(buffer).map_err(ProvError::serialization)
    }
}

/// Render `graph` in `format` using the graph's namespace table
pub fn serialize(graph: &ProvGraph, format: RdfFormat) -> Result<String> {
    let namespaces = graph.namespaces().clone();
    match format {
        RdfFormat::Turtle => TurtleSerializer::new(namespaces).serialize_to_string(graph),
        RdfFormat::NTriples => NTriplesSerializer::new().serialize_to_string(graph),
        RdfFormat::RdfXml => RdfXmlSerializer::new(namespaces).serialize_to_string(graph),
        RdfFormat::JsonLd => JsonLdSerializer::new(namespaces)
            .pretty()
            .serialize_to_string(graph),
    }
}

/// Render `graph` in the format named by a caller
///
/// `None` selects Turtle; unknown names fail with
/// [`ProvError::UnsupportedFormat`] before any output is produced.
pub fn serialize_named(graph: &ProvGraph, format: Option<&str>) -> Result<String> {
    serialize(graph, RdfFormat::from_name(format)?)
}

/// Escape a string for a quoted N-Triples / Turtle literal
pub(crate) fn escape_literal(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 2);
    result.push('"');

    for ch in input.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0C' => result.push_str("\\f"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => result.push(c),
        }
    }

    result.push('"');
    result
}
