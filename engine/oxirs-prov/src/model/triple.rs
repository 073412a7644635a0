use super::{NamedNode, Subject, Term};
use std::fmt;

/// An RDF triple
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    subject: Subject,
    predicate: NamedNode,
    object: Term,
}

impl Triple {
    pub fn new(
        subject: impl Into<Subject>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn predicate(&self) -> &NamedNode {
        &self.predicate
    }

    pub fn object(&self) -> &Term {
        &self.object
    }

    /// Check whether the triple matches a pattern; `None` matches anything
    pub fn matches_pattern(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> bool {
        subject.map_or(true, |s| s == &self.subject)
            && predicate.map_or(true, |p| p == &self.predicate)
            && object.map_or(true, |o| o == &self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
