//! Turtle serializer
//!
//! Triples are grouped by subject (in first-appearance order) and written
//! with `;` and `,` abbreviations. IRIs are shortened against the namespace
//! table when the local part is a valid prefixed name.

use super::{escape_literal, GraphSerializer};
use crate::error::Result;
use crate::graph::ProvGraph;
use crate::model::{Literal, NamedNode, Subject, Term};
use crate::namespaces::Namespaces;
use crate::vocab::rdf;
use indexmap::IndexMap;
use std::io::Write;

/// Turtle serializer implementation
#[derive(Debug, Clone)]
pub struct TurtleSerializer {
    namespaces: Namespaces,
    indent: String,
}

impl TurtleSerializer {
    /// Create a new Turtle serializer
    pub fn new(namespaces: Namespaces) -> Self {
        Self {
            namespaces,
            indent: "    ".to_string(),
        }
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    fn write_prefixes<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (prefix, iri) in self.namespaces.iter() {
            writeln!(writer, "@prefix {prefix}: <{iri}> .")?;
        }
        if !self.namespaces.is_empty() {
            writeln!(writer)?;
        }
        Ok(())
    }

    fn format_subject(&self, subject: &Subject) -> String {
        match subject {
            Subject::NamedNode(node) => self.format_named_node(node),
            Subject::BlankNode(node) => format!("_:{}", node.label()),
        }
    }

    fn format_predicate(&self, predicate: &NamedNode) -> String {
        if predicate.as_str() == rdf::TYPE.as_str() {
            "a".to_string()
        } else {
            self.format_named_node(predicate)
        }
    }

    fn format_object(&self, object: &Term) -> String {
        match object {
            Term::NamedNode(node) => self.format_named_node(node),
            Term::BlankNode(node) => format!("_:{}", node.label()),
            Term::Literal(literal) => self.format_literal(literal),
        }
    }

    /// Serialize a named node with prefix abbreviation
    fn format_named_node(&self, node: &NamedNode) -> String {
        let iri = node.as_str();
        if let Some((prefix, local)) = self.namespaces.split(iri) {
            if is_valid_local_name(local) {
                return format!("{prefix}:{local}");
            }
        }
        format!("<{iri}>")
    }

    fn format_literal(&self, literal: &Literal) -> String {
        let escaped = escape_literal(literal.value());
        if literal.is_plain() {
            escaped
        } else {
            format!("{escaped}^^{}", self.format_named_node(literal.datatype()))
        }
    }
}

impl GraphSerializer for TurtleSerializer {
    fn serialize_graph<W: Write>(&self, graph: &ProvGraph, mut writer: W) -> Result<()> {
        self.write_prefixes(&mut writer)?;

        let mut subjects: IndexMap<&Subject, IndexMap<&NamedNode, Vec<&Term>>> = IndexMap::new();
        for triple in graph {
            subjects
                .entry(triple.subject())
                .or_default()
                .entry(triple.predicate())
                .or_default()
                .push(triple.object());
        }

        for (index, (subject, predicates)) in subjects.iter().enumerate() {
            if index > 0 {
                writeln!(writer)?;
            }
            write!(writer, "{}", self.format_subject(subject))?;
            for (p_index, (predicate, objects)) in predicates.iter().enumerate() {
                if p_index > 0 {
                    write!(writer, " ;\n{}", self.indent)?;
                } else {
                    write!(writer, " ")?;
                }
                let objects: Vec<String> = objects.iter().map(|o| self.format_object(o)).collect();
                write!(
                    writer,
                    "{} {}",
                    self.format_predicate(predicate),
                    objects.join(", ")
                )?;
            }
            writeln!(writer, " .")?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Check if a string is a valid local name for Turtle prefixed names
fn is_valid_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return true;
    };

    if !is_pn_chars_base(first) && first != '_' && !first.is_ascii_digit() {
        return false;
    }

    if !chars.all(|ch| is_pn_chars(ch) || ch == '.' || ch == '-') {
        return false;
    }

    !local.ends_with('.')
}

/// Check if character is a PN_CHARS_BASE (per Turtle grammar)
fn is_pn_chars_base(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || ('\u{00C0}'..='\u{00D6}').contains(&ch)
        || ('\u{00D8}'..='\u{00F6}').contains(&ch)
        || ('\u{00F8}'..='\u{02FF}').contains(&ch)
        || ('\u{0370}'..='\u{037D}').contains(&ch)
        || ('\u{037F}'..='\u{1FFF}').contains(&ch)
        || ('\u{200C}'..='\u{200D}').contains(&ch)
        || ('\u{2070}'..='\u{218F}').contains(&ch)
        || ('\u{2C00}'..='\u{2FEF}').contains(&ch)
        || ('\u{3001}'..='\u{D7FF}').contains(&ch)
        || ('\u{F900}'..='\u{FDCF}').contains(&ch)
        || ('\u{FDF0}'..='\u{FFFD}').contains(&ch)
}

/// Check if character is a PN_CHARS (per Turtle grammar)
fn is_pn_chars(ch: char) -> bool {
    is_pn_chars_base(ch)
        || ch == '_'
        || ch == '-'
        || ch.is_ascii_digit()
        || ch == '\u{00B7}'
        || ('\u{0300}'..='\u{036F}').contains(&ch)
        || ('\u{203F}'..='\u{2040}').contains(&ch)
}
