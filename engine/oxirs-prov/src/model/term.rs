//! Node and literal types
//!
//! Blank nodes are arena handles rather than labelled strings: the label is
//! derived from the handle when a graph is serialized, so every edge that
//! refers to the same anonymous node renders the same label.

use crate::error::{ProvError, Result};
use crate::vocab::xsd;
use oxiri::Iri;
use std::fmt;

/// An IRI-identified node
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode {
    iri: String,
}

impl NamedNode {
    /// Create a named node, validating the IRI
    pub fn new(iri: impl Into<String>) -> Result<Self> {
        let iri = iri.into();
        match Iri::parse(iri.as_str()) {
            Ok(_) => Ok(Self { iri }),
            Err(e) => Err(ProvError::InvalidIri {
                message: e.to_string(),
                iri,
            }),
        }
    }

    /// Create a named node without validation
    ///
    /// The caller guarantees `iri` is absolute and well formed.
    pub fn new_unchecked(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.iri
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

/// Handle of an anonymous node within one [`ProvGraph`](crate::ProvGraph)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An anonymous node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode(NodeId);

impl BlankNode {
    pub(crate) fn from_id(id: NodeId) -> Self {
        BlankNode(id)
    }

    pub fn id(&self) -> NodeId {
        self.0
    }

    /// Label used in serialized output (without the `_:` marker)
    pub fn label(&self) -> String {
        format!("b{}", self.0 .0)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.label())
    }
}

/// A typed literal
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    value: String,
    datatype: NamedNode,
}

impl Literal {
    pub fn new_typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            datatype,
        }
    }

    /// An `xsd:string` literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::new_typed(value, xsd::STRING.clone())
    }

    /// An `xsd:token` literal
    pub fn token(value: impl Into<String>) -> Self {
        Self::new_typed(value, xsd::TOKEN.clone())
    }

    /// An `xsd:anyURI` literal
    pub fn any_uri(value: impl Into<String>) -> Self {
        Self::new_typed(value, xsd::ANY_URI.clone())
    }

    /// An `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Self::new_typed(value.to_string(), xsd::INTEGER.clone())
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> &NamedNode {
        &self.datatype
    }

    /// Whether this literal is a plain `xsd:string`
    pub fn is_plain(&self) -> bool {
        self.datatype.as_str() == xsd::STRING.as_str()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}^^{}", self.value, self.datatype)
    }
}

/// Subject position: a named or a blank node
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

impl Subject {
    pub fn as_blank(&self) -> Option<BlankNode> {
        match self {
            Subject::BlankNode(b) => Some(*b),
            Subject::NamedNode(_) => None,
        }
    }

    pub fn as_named(&self) -> Option<&NamedNode> {
        match self {
            Subject::NamedNode(n) => Some(n),
            Subject::BlankNode(_) => None,
        }
    }
}

impl From<NamedNode> for Subject {
    fn from(node: NamedNode) -> Self {
        Subject::NamedNode(node)
    }
}

impl From<&NamedNode> for Subject {
    fn from(node: &NamedNode) -> Self {
        Subject::NamedNode(node.clone())
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Subject::BlankNode(node)
    }
}

impl From<&Subject> for Subject {
    fn from(node: &Subject) -> Self {
        node.clone()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::NamedNode(n) => n.fmt(f),
            Subject::BlankNode(b) => b.fmt(f),
        }
    }
}

/// Object position: any term
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
}

impl Term {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_blank(&self) -> Option<BlankNode> {
        match self {
            Term::BlankNode(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&NamedNode> {
        match self {
            Term::NamedNode(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => n.fmt(f),
            Term::BlankNode(b) => b.fmt(f),
            Term::Literal(l) => l.fmt(f),
        }
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<&NamedNode> for Term {
    fn from(node: &NamedNode) -> Self {
        Term::NamedNode(node.clone())
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

impl From<Subject> for Term {
    fn from(node: Subject) -> Self {
        match node {
            Subject::NamedNode(n) => Term::NamedNode(n),
            Subject::BlankNode(b) => Term::BlankNode(b),
        }
    }
}

impl From<&Subject> for Term {
    fn from(node: &Subject) -> Self {
        node.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node_validation() {
        assert!(NamedNode::new("http://lod.bco-dmo.org/id/person/51069").is_ok());
        let err = NamedNode::new("not an iri").unwrap_err();
        assert!(matches!(err, ProvError::InvalidIri { .. }));
    }

    #[test]
    fn test_blank_node_label() {
        let node = BlankNode::from_id(NodeId(7));
        assert_eq!(node.label(), "b7");
        assert_eq!(node.to_string(), "_:b7");
    }

    #[test]
    fn test_literal_constructors() {
        assert!(Literal::string("T").is_plain());
        assert_eq!(Literal::integer(3).value(), "3");
        assert_eq!(
            Literal::token("csv").datatype().as_str(),
            "http://www.w3.org/2001/XMLSchema#token"
        );
    }
}
