//! RDF/XML serializer
//!
//! Writes one `rdf:Description` per subject. Blank nodes use `rdf:nodeID`,
//! typed literals `rdf:datatype`. Predicates outside the namespace table get
//! a local `xmlns` declaration on their element.

use super::GraphSerializer;
use crate::error::{ProvError, Result};
use crate::graph::ProvGraph;
use crate::model::{NamedNode, Subject, Term};
use crate::namespaces::Namespaces;
use crate::vocab::rdf;
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Write;

/// A [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) serializer.
#[derive(Debug, Clone)]
pub struct RdfXmlSerializer {
    namespaces: Namespaces,
}

/// Qualified element name for a predicate
struct QualifiedName {
    name: String,
    /// Namespace declaration needed on the element itself
    declaration: Option<(String, String)>,
}

impl RdfXmlSerializer {
    /// Builds a new [`RdfXmlSerializer`].
    pub fn new(namespaces: Namespaces) -> Self {
        // rdf must always be bound to the RDF namespace
        Self {
            namespaces: namespaces.with_prefix("rdf", rdf::NAMESPACE),
        }
    }

    fn qualify(&self, predicate: &NamedNode) -> Result<QualifiedName> {
        let iri = predicate.as_str();
        if let Some((prefix, local)) = self.namespaces.split(iri) {
            if !prefix.is_empty() && is_xml_local_name(local) {
                return Ok(QualifiedName {
                    name: format!("{prefix}:{local}"),
                    declaration: None,
                });
            }
        }

        let split = iri
            .rfind(['#', '/'])
            .map(|pos| pos + 1)
            .filter(|pos| is_xml_local_name(&iri[*pos..]))
            .ok_or_else(|| {
                ProvError::serialization(format!(
                    "predicate <{iri}> cannot be written as an XML element name"
                ))
            })?;
        Ok(QualifiedName {
            name: format!("ns0:{}", &iri[split..]),
            declaration: Some(("xmlns:ns0".to_string(), iri[..split].to_string())),
        })
    }

    fn write_property<W: Write>(
        &self,
        writer: &mut Writer<W>,
        predicate: &NamedNode,
        object: &Term,
    ) -> Result<()> {
        let qname = self.qualify(predicate)?;
        let mut element = BytesStart::new(qname.name.as_str());
        if let Some((attr, ns)) = &qname.declaration {
            element.push_attribute((attr.as_str(), ns.as_str()));
        }

        match object {
            Term::NamedNode(node) => {
                element.push_attribute(("rdf:resource", node.as_str()));
                write_event(writer, Event::Empty(element))
            }
            Term::BlankNode(node) => {
                let label = node.label();
                element.push_attribute(("rdf:nodeID", label.as_str()));
                write_event(writer, Event::Empty(element))
            }
            Term::Literal(literal) => {
                if !literal.is_plain() {
                    element.push_attribute(("rdf:datatype", literal.datatype().as_str()));
                }
                write_event(writer, Event::Start(element))?;
                let text = xml_text(literal.value());
                write_event(writer, Event::Text(BytesText::new(&text)))?;
                write_event(writer, Event::End(BytesEnd::new(qname.name.as_str())))
            }
        }
    }
}

impl GraphSerializer for RdfXmlSerializer {
    fn serialize_graph<W: Write>(&self, graph: &ProvGraph, writer: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(writer, b'\t', 1);
        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        let mut root = BytesStart::new("rdf:RDF");
        let declarations: Vec<(String, &str)> = self
            .namespaces
            .iter()
            .map(|(prefix, iri)| (format!("xmlns:{prefix}"), iri))
            .collect();
        for (attr, iri) in &declarations {
            root.push_attribute((attr.as_str(), *iri));
        }
        write_event(&mut writer, Event::Start(root))?;

        let mut subjects: IndexMap<&Subject, Vec<(&NamedNode, &Term)>> = IndexMap::new();
        for triple in graph {
            subjects
                .entry(triple.subject())
                .or_default()
                .push((triple.predicate(), triple.object()));
        }

        for (subject, properties) in &subjects {
            let mut description = BytesStart::new("rdf:Description");
            match subject {
                Subject::NamedNode(node) => {
                    description.push_attribute(("rdf:about", node.as_str()));
                }
                Subject::BlankNode(node) => {
                    description.push_attribute(("rdf:nodeID", node.label().as_str()));
                }
            }
            write_event(&mut writer, Event::Start(description))?;
            for (predicate, object) in properties {
                self.write_property(&mut writer, predicate, object)?;
            }
            write_event(&mut writer, Event::End(BytesEnd::new("rdf:Description")))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("rdf:RDF")))?;
        let mut inner = writer.into_inner();
        inner.write_all(b"\n")?;
        inner.flush()?;
        Ok(())
    }
}

fn write_event<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(ProvError::serialization)
}

/// Replace characters XML 1.0 cannot carry, even as references, with U+FFFD
fn xml_text(value: &str) -> Cow<'_, str> {
    let allowed = |c: char| {
        !matches!(
            c,
            '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
        )
    };
    if value.chars().all(allowed) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(
            value
                .chars()
                .map(|c| if allowed(c) { c } else { char::REPLACEMENT_CHARACTER })
                .collect(),
        )
    }
}

/// Whether `local` can follow a prefix in an XML element name
fn is_xml_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::model::Literal;
    use crate::vocab::{prov, schema};

    #[test]
    fn test_descriptions() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let data = graph.mint(NodeKind::ProcessedData);
        graph.insert(data, &schema::ENCODING_FORMAT, Literal::token("csv"));
        graph.insert(data, &schema::NAME, Literal::string("a < b & c"));

        let output = RdfXmlSerializer::new(Namespaces::provenance())
            .serialize_to_string(&graph)
            .unwrap();

        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(output.contains("xmlns:prov=\"http://www.w3.org/ns/prov#\""));
        assert!(output.contains("<rdf:Description rdf:nodeID=\"b0\">"));
        assert!(output.contains("<rdf:type rdf:resource=\"http://www.w3.org/ns/prov#Bundle\"/>"));
        assert!(output.contains("<rdfs:isDefinedBy rdf:nodeID=\"b0\"/>"));
        assert!(output.contains(
            "<schema:encodingFormat rdf:datatype=\"http://www.w3.org/2001/XMLSchema#token\">csv</schema:encodingFormat>"
        ));
        assert!(output.contains("<schema:name>a &lt; b &amp; c</schema:name>"));
        assert!(output.trim_end().ends_with("</rdf:RDF>"));
    }

    #[test]
    fn test_control_characters_replaced() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        graph.insert(graph.bundle(), &schema::NAME, Literal::string("T\u{1}\tx\u{1f}"));

        let output = RdfXmlSerializer::new(Namespaces::provenance())
            .serialize_to_string(&graph)
            .unwrap();
        assert!(output.contains("<schema:name>T\u{fffd}\tx\u{fffd}</schema:name>"));
        assert!(!output.contains('\u{1}'));
        assert!(matches!(xml_text("plain\nline"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unbound_predicate_gets_local_namespace() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let predicate = NamedNode::new("http://example.org/terms#checksum").unwrap();
        graph.insert(graph.bundle(), &predicate, Literal::string("abc"));
        graph.insert(graph.bundle(), &prov::WAS_ATTRIBUTED_TO, &*prov::PERSON);

        let output = RdfXmlSerializer::new(Namespaces::provenance())
            .serialize_to_string(&graph)
            .unwrap();
        assert!(output.contains(
            "<ns0:checksum xmlns:ns0=\"http://example.org/terms#\">abc</ns0:checksum>"
        ));
    }
}
