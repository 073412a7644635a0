//! Provenance graph with an arena of anonymous nodes
//!
//! Every anonymous node is minted through [`ProvGraph::mint`], which records
//! what the node stands for and scopes it to the bundle with a single
//! `rdfs:isDefinedBy` edge. The bundle itself is always handle 0.

use crate::model::*;
use crate::namespaces::Namespaces;
use crate::vocab::{odo, prov, rdf, rdfs};
use indexmap::IndexSet;

/// What an anonymous node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Bundle,
    Plan,
    Variable,
    Identifier,
    Submission,
    Activity,
    Association,
    Delegation,
    Software,
    Agent,
    Step,
    DataPackage,
    ProcessedData,
    RawData,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
}

/// An assembled provenance graph
///
/// Triples are kept in insertion order and deduplicated, which makes
/// serialization deterministic for a given build.
#[derive(Debug, Clone)]
pub struct ProvGraph {
    nodes: Vec<NodeRecord>,
    triples: IndexSet<Triple>,
    namespaces: Namespaces,
}

impl ProvGraph {
    /// Create a graph holding only its bundle node
    pub fn new(namespaces: Namespaces) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            triples: IndexSet::new(),
            namespaces,
        };
        let bundle = graph.allocate(NodeKind::Bundle);
        graph.insert(bundle, &rdf::TYPE, &*prov::BUNDLE);
        graph
    }

    fn allocate(&mut self, kind: NodeKind) -> BlankNode {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord { kind });
        BlankNode::from_id(id)
    }

    /// The bundle scoping every other node
    pub fn bundle(&self) -> BlankNode {
        BlankNode::from_id(NodeId(0))
    }

    /// Mint a fresh anonymous node defined by the bundle
    pub fn mint(&mut self, kind: NodeKind) -> BlankNode {
        let node = self.allocate(kind);
        let bundle = self.bundle();
        self.insert(node, &rdfs::IS_DEFINED_BY, bundle);
        node
    }

    /// Add a triple; returns `false` if it was already present
    pub fn insert(
        &mut self,
        subject: impl Into<Subject>,
        predicate: &NamedNode,
        object: impl Into<Term>,
    ) -> bool {
        self.triples
            .insert(Triple::new(subject, predicate.clone(), object))
    }

    /// Add one `rdf:type` triple per class
    pub fn insert_types(&mut self, subject: impl Into<Subject>, classes: &[&NamedNode]) {
        let subject = subject.into();
        for class in classes {
            self.insert(&subject, &rdf::TYPE, *class);
        }
    }

    /// Attach an identifier node to `subject`
    ///
    /// The node is typed with `class`, carries the value as an `xsd:token` and,
    /// when given, the identifier scheme.
    pub fn attach_identifier(
        &mut self,
        subject: impl Into<Subject>,
        value: &str,
        scheme: Option<&NamedNode>,
        class: &NamedNode,
    ) -> BlankNode {
        let identifier = self.mint(NodeKind::Identifier);
        self.insert(subject, &odo::IDENTIFIER, identifier);
        self.insert(identifier, &rdf::TYPE, class);
        if let Some(scheme) = scheme {
            self.insert(identifier, &odo::IDENTIFIER_SCHEME, scheme);
        }
        self.insert(identifier, &odo::IDENTIFIER_VALUE, Literal::token(value));
        identifier
    }

    /// Iterate triples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Query triples matching a pattern; `None` acts as a wildcard
    pub fn query(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Vec<&Triple> {
        self.triples
            .iter()
            .filter(|t| t.matches_pattern(subject, predicate, object))
            .collect()
    }

    /// Objects of `subject predicate ?o`
    pub fn objects(&self, subject: &Subject, predicate: &NamedNode) -> Vec<&Term> {
        self.query(Some(subject), Some(predicate), None)
            .into_iter()
            .map(Triple::object)
            .collect()
    }

    /// Subjects of `?s predicate object`
    pub fn subjects(&self, predicate: &NamedNode, object: &Term) -> Vec<&Subject> {
        self.query(None, Some(predicate), Some(object))
            .into_iter()
            .map(Triple::subject)
            .collect()
    }

    /// Anonymous nodes of one kind, in minting order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<BlankNode> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, record)| record.kind == kind)
            .map(|(index, _)| BlankNode::from_id(NodeId(index)))
            .collect()
    }

    pub fn kind_of(&self, node: BlankNode) -> Option<NodeKind> {
        self.nodes.get(node.id().index()).map(|record| record.kind)
    }

    /// Number of anonymous nodes, the bundle included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProvGraph {
    type Item = &'a Triple;
    type IntoIter = indexmap::set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_graph_has_bundle() {
        let graph = ProvGraph::new(Namespaces::provenance());
        let bundle: Subject = graph.bundle().into();
        assert_eq!(graph.kind_of(graph.bundle()), Some(NodeKind::Bundle));
        assert_eq!(graph.objects(&bundle, &rdf::TYPE), vec![&Term::from(prov::BUNDLE.clone())]);
        assert!(graph.objects(&bundle, &rdfs::IS_DEFINED_BY).is_empty());
    }

    #[test]
    fn test_mint_scopes_to_bundle() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let step = graph.mint(NodeKind::Step);
        let defined_by = graph.objects(&step.into(), &rdfs::IS_DEFINED_BY);
        assert_eq!(defined_by, vec![&Term::from(graph.bundle())]);
        assert_eq!(graph.nodes_of_kind(NodeKind::Step), vec![step]);
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let plan = graph.mint(NodeKind::Plan);
        assert!(graph.insert(plan, &rdf::TYPE, &*prov::PLAN));
        assert!(!graph.insert(plan, &rdf::TYPE, &*prov::PLAN));
    }

    #[test]
    fn test_attach_identifier() {
        let mut graph = ProvGraph::new(Namespaces::provenance());
        let agent = graph.mint(NodeKind::Agent);
        let id = graph.attach_identifier(
            agent,
            "0000-0001-2345-6789",
            Some(&odo::IDENTIFIER_SCHEME_ORCID),
            &odo::IDENTIFIER_TYPE,
        );
        let id_subject: Subject = id.into();
        assert_eq!(
            graph.objects(&id_subject, &odo::IDENTIFIER_VALUE),
            vec![&Term::from(Literal::token("0000-0001-2345-6789"))]
        );
        assert_eq!(
            graph.objects(&id_subject, &odo::IDENTIFIER_SCHEME),
            vec![&Term::from(odo::IDENTIFIER_SCHEME_ORCID.clone())]
        );
    }
}
