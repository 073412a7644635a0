//! JSON-LD serializer
//!
//! Produces a single document with an `@context` holding the namespace table
//! and an `@graph` array with one node object per subject. Property values are
//! always arrays so repeated predicates need no special casing.

use super::GraphSerializer;
use crate::error::{ProvError, Result};
use crate::graph::ProvGraph;
use crate::model::{Literal, NamedNode, Subject, Term};
use crate::namespaces::Namespaces;
use crate::vocab::rdf;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::io::Write;

/// JSON-LD (compacted against the namespace table) serializer
#[derive(Debug, Clone)]
pub struct JsonLdSerializer {
    namespaces: Namespaces,
    pretty: bool,
}

impl JsonLdSerializer {
    pub fn new(namespaces: Namespaces) -> Self {
        Self {
            namespaces,
            pretty: false,
        }
    }

    /// Indent the output
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn compact(&self, iri: &str) -> String {
        match self.namespaces.split(iri) {
            Some((prefix, local)) if !local.is_empty() && !local.starts_with("//") => {
                format!("{prefix}:{local}")
            }
            _ => iri.to_string(),
        }
    }

    fn subject_id(&self, subject: &Subject) -> String {
        match subject {
            Subject::NamedNode(node) => node.as_str().to_string(),
            Subject::BlankNode(node) => node.to_string(),
        }
    }

    fn literal_value(&self, literal: &Literal) -> Value {
        if literal.is_plain() {
            json!({ "@value": literal.value() })
        } else {
            json!({
                "@value": literal.value(),
                "@type": self.compact(literal.datatype().as_str()),
            })
        }
    }

    fn object_value(&self, object: &Term) -> Value {
        match object {
            Term::NamedNode(node) => json!({ "@id": node.as_str() }),
            Term::BlankNode(node) => json!({ "@id": node.to_string() }),
            Term::Literal(literal) => self.literal_value(literal),
        }
    }

    /// Build the JSON-LD document as a value
    pub fn to_value(&self, graph: &ProvGraph) -> Value {
        let mut context = Map::new();
        for (prefix, iri) in self.namespaces.iter() {
            context.insert(prefix.to_string(), Value::String(iri.to_string()));
        }

        let mut subjects: IndexMap<&Subject, Vec<(&NamedNode, &Term)>> = IndexMap::new();
        for triple in graph {
            subjects
                .entry(triple.subject())
                .or_default()
                .push((triple.predicate(), triple.object()));
        }

        let nodes: Vec<Value> = subjects
            .iter()
            .map(|(subject, properties)| self.node_object(subject, properties))
            .collect();

        json!({
            "@context": Value::Object(context),
            "@graph": nodes,
        })
    }

    fn node_object(&self, subject: &Subject, properties: &[(&NamedNode, &Term)]) -> Value {
        let mut object = Map::new();
        object.insert("@id".to_string(), Value::String(self.subject_id(subject)));

        for (predicate, term) in properties {
            if predicate.as_str() == rdf::TYPE.as_str() {
                if let Term::NamedNode(class) = term {
                    push_value(
                        &mut object,
                        "@type",
                        Value::String(self.compact(class.as_str())),
                    );
                    continue;
                }
            }
            push_value(
                &mut object,
                &self.compact(predicate.as_str()),
                self.object_value(term),
            );
        }

        Value::Object(object)
    }
}

fn push_value(object: &mut Map<String, Value>, key: &str, value: Value) {
    match object
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(values) => values.push(value),
        other => *other = Value::Array(vec![other.take(), value]),
    }
}

impl GraphSerializer for JsonLdSerializer {
    fn serialize_graph<W: Write>(&self, graph: &ProvGraph, mut writer: W) -> Result<()> {
        let document = self.to_value(graph);
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &document)
        } else {
            serde_json::to_writer(&mut writer, &document)
        };
        written.map_err(ProvError::serialization)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::vocab::{plan, prov, schema};

    fn sample() -> ProvGraph {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let plan_node = graph.mint(NodeKind::Plan);
        graph.insert_types(plan_node, &[&prov::PLAN, &prov::COLLECTION]);
        graph.insert(plan_node, &schema::NAME, Literal::string("Pipeline"));
        let step = graph.mint(NodeKind::Step);
        graph.insert(step, &plan::IS_STEP_OF_PLAN, plan_node);
        graph.insert(step, &rdf::VALUE, Literal::integer(0));
        graph
    }

    #[test]
    fn test_context_and_graph() {
        let document = JsonLdSerializer::new(Namespaces::provenance()).to_value(&sample());

        assert_eq!(document["@context"]["prov"], "http://www.w3.org/ns/prov#");
        let nodes = document["@graph"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["@id"], "_:b0");
        assert_eq!(nodes[0]["@type"], json!(["prov:Bundle"]));

        let plan_node = &nodes[1];
        assert_eq!(plan_node["@type"], json!(["prov:Plan", "prov:Collection"]));
        assert_eq!(plan_node["schema:name"], json!([{ "@value": "Pipeline" }]));
        assert_eq!(plan_node["rdfs:isDefinedBy"], json!([{ "@id": "_:b0" }]));

        let step = &nodes[2];
        assert_eq!(step["plan:isStepOfPlan"], json!([{ "@id": "_:b1" }]));
        assert_eq!(
            step["rdf:value"],
            json!([{ "@value": "0", "@type": "xsd:integer" }])
        );
    }

    #[test]
    fn test_output_parses_as_json() {
        let output = JsonLdSerializer::new(Namespaces::provenance())
            .pretty()
            .serialize_to_string(&sample())
            .unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert!(parsed["@graph"].is_array());
        assert!(output.contains("\n  \"@context\""));
    }
}
