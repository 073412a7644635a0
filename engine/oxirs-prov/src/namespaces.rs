//! Namespace prefix table handed to serializers

use crate::vocab::{dcterms, odo, plan, prov, rdf, rdfs, schema, xsd};
use std::collections::BTreeMap;

/// Immutable prefix → namespace IRI table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    prefixes: BTreeMap<String, String>,
}

impl Namespaces {
    /// An empty table
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// The prefixes bound in every provenance bundle
    pub fn provenance() -> Self {
        Self::empty()
            .with_prefix("dcterms", dcterms::NAMESPACE)
            .with_prefix("odo", odo::NAMESPACE)
            .with_prefix("plan", plan::NAMESPACE)
            .with_prefix("prov", prov::NAMESPACE)
            .with_prefix("rdf", rdf::NAMESPACE)
            .with_prefix("rdfs", rdfs::NAMESPACE)
            .with_prefix("schema", schema::NAMESPACE)
            .with_prefix("xsd", xsd::NAMESPACE)
    }

    /// Bind an additional prefix, replacing an existing binding of the same name
    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), iri.into());
        self
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Iterate bindings ordered by prefix
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, i)| (p.as_str(), i.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Split an IRI into a bound prefix and local part
    ///
    /// The longest matching namespace wins, so nested namespaces abbreviate
    /// against the most specific binding.
    pub fn split<'a>(&'a self, iri: &'a str) -> Option<(&'a str, &'a str)> {
        self.prefixes
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| (prefix.as_str(), &iri[ns.len()..]))
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::provenance()
    }
}
