//! N-Triples serializer

use super::{escape_literal, GraphSerializer};
use crate::error::Result;
use crate::graph::ProvGraph;
use crate::model::{Literal, Subject, Term, Triple};
use std::io::Write;

/// N-Triples serializer
///
/// One triple per line, absolute IRIs only; prefixes are never used.
#[derive(Debug, Clone, Default)]
pub struct NTriplesSerializer;

impl NTriplesSerializer {
    /// Create a new N-Triples serializer
    pub fn new() -> Self {
        Self
    }

    /// Format a single triple as an N-Triples line (without newline)
    pub fn format_triple(&self, triple: &Triple) -> String {
        format!(
            "{} <{}> {} .",
            self.format_subject(triple.subject()),
            triple.predicate().as_str(),
            self.format_object(triple.object())
        )
    }

    fn format_subject(&self, subject: &Subject) -> String {
        match subject {
            Subject::NamedNode(nn) => format!("<{}>", nn.as_str()),
            Subject::BlankNode(bn) => format!("_:{}", bn.label()),
        }
    }

    fn format_object(&self, object: &Term) -> String {
        match object {
            Term::NamedNode(nn) => format!("<{}>", nn.as_str()),
            Term::BlankNode(bn) => format!("_:{}", bn.label()),
            Term::Literal(literal) => self.format_literal(literal),
        }
    }

    fn format_literal(&self, literal: &Literal) -> String {
        let escaped = escape_literal(literal.value());
        if literal.is_plain() {
            escaped
        } else {
            format!("{escaped}^^<{}>", literal.datatype().as_str())
        }
    }
}

impl GraphSerializer for NTriplesSerializer {
    fn serialize_graph<W: Write>(&self, graph: &ProvGraph, mut writer: W) -> Result<()> {
        for triple in graph {
            writeln!(writer, "{}", self.format_triple(triple))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::namespaces::Namespaces;
    use crate::vocab::{plan, rdfs, schema};

    #[test]
    fn test_serialize_triple() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let step = graph.mint(NodeKind::Step);
        graph.insert(step, &rdfs::LABEL, Literal::token("load"));
        graph.insert(step, &schema::NAME, Literal::string("say \"hi\""));

        let output = NTriplesSerializer::new().serialize_to_string(&graph).unwrap();
        assert!(output.contains(
            "_:b1 <http://www.w3.org/2000/01/rdf-schema#label> \"load\"^^<http://www.w3.org/2001/XMLSchema#token> ."
        ));
        assert!(output.contains("_:b1 <http://schema.org/name> \"say \\\"hi\\\"\" ."));
        assert!(output.contains("_:b1 <http://www.w3.org/2000/01/rdf-schema#isDefinedBy> _:b0 ."));
        assert_eq!(output.lines().count(), graph.len());
        assert!(!output.contains(plan::NAMESPACE));
    }
}
