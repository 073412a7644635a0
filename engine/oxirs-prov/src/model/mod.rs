//! RDF terms and triples used by provenance graphs

mod term;
mod triple;

pub use term::{BlankNode, Literal, NamedNode, NodeId, Subject, Term};
pub use triple::Triple;
