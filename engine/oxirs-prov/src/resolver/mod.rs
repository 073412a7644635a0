//! Data manager identity resolution
//!
//! A data manager is referenced by ORCID and, optionally, a display name.
//! [`IdentityResolver::resolve`] asks an [`IdentityLookup`] service for agents
//! already registered under that ORCID. When the service has an answer, the
//! agent is that external IRI. Otherwise (no candidates, timeout, transport
//! failure, bad data) a fresh anonymous agent is minted in the graph and the
//! ORCID is attached to it, so the record stays traceable.

mod sparql;

pub use sparql::{
    parse_candidates, SparqlIdentityLookup, DEFAULT_ENDPOINT as DEFAULT_LOOKUP_ENDPOINT,
};

use crate::graph::{NodeKind, ProvGraph};
use crate::model::{Literal, NamedNode, Subject};
use crate::vocab::{odo, rdfs};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on one lookup round trip
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Recoverable identity lookup failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("identity lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("identity lookup transport error: {0}")]
    Transport(String),
    #[error("malformed identity lookup response: {0}")]
    MalformedResponse(String),
    #[error("no registered agent")]
    NoCandidates,
    #[error("registered agent IRI <{iri}> is invalid: {message}")]
    InvalidCandidate { iri: String, message: String },
}

/// Read-only query for agents registered under an identifier
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Candidate agent IRIs, in the order the service returned them
    async fn lookup(&self, identifier: &str) -> std::result::Result<Vec<String>, LookupError>;
}

/// How to pick an agent among several candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidatePolicy {
    /// The first candidate in service order wins
    #[default]
    FirstReturned,
}

impl CandidatePolicy {
    pub fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        match self {
            CandidatePolicy::FirstReturned => candidates.first().map(String::as_str),
        }
    }
}

/// Resolves data manager references to agent nodes
#[derive(Clone)]
pub struct IdentityResolver {
    lookup: Arc<dyn IdentityLookup>,
    timeout: Duration,
    policy: CandidatePolicy,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(lookup: Arc<dyn IdentityLookup>) -> Self {
        Self {
            lookup,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            policy: CandidatePolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a data manager to an agent
    ///
    /// Never fails: every lookup problem degrades to an anonymous agent minted
    /// in `graph`.
    pub async fn resolve(
        &self,
        graph: &mut ProvGraph,
        identifier: Option<&str>,
        display_name: Option<&str>,
    ) -> Subject {
        let identifier = identifier.map(str::trim).filter(|id| !id.is_empty());
        let Some(identifier) = identifier else {
            warn!("No data manager ORCID available; using an anonymous agent");
            return mint_anonymous(graph, None, display_name);
        };

        match self.find_registered(identifier).await {
            Ok(agent) => {
                debug!("Resolved ORCID {} to {}", identifier, agent.as_str());
                Subject::NamedNode(agent)
            }
            Err(reason) => {
                warn!(
                    "Could not resolve data manager ORCID {}: {}; using an anonymous agent",
                    identifier, reason
                );
                mint_anonymous(graph, Some(identifier), display_name)
            }
        }
    }

    /// The registered agent for `identifier`, as chosen by the policy
    pub async fn find_registered(
        &self,
        identifier: &str,
    ) -> std::result::Result<NamedNode, LookupError> {
        let candidates = tokio::time::timeout(self.timeout, self.lookup.lookup(identifier))
            .await
            .map_err(|_| LookupError::Timeout(self.timeout))??;

        let selected = self
            .policy
            .select(&candidates)
            .ok_or(LookupError::NoCandidates)?;
        NamedNode::new(selected).map_err(|e| LookupError::InvalidCandidate {
            iri: selected.to_string(),
            message: e.to_string(),
        })
    }
}

fn mint_anonymous(
    graph: &mut ProvGraph,
    identifier: Option<&str>,
    display_name: Option<&str>,
) -> Subject {
    let agent = graph.mint(NodeKind::Agent);
    if let Some(name) = display_name {
        graph.insert(agent, &rdfs::LABEL, Literal::string(name));
    }
    if let Some(identifier) = identifier {
        graph.attach_identifier(
            agent,
            identifier,
            Some(&odo::IDENTIFIER_SCHEME_ORCID),
            &odo::IDENTIFIER_TYPE,
        );
    }
    Subject::BlankNode(agent)
}

/// Lookup answering from a fixed table
///
/// Identifiers missing from the table have no candidates.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityLookup {
    entries: HashMap<String, Vec<String>>,
}

impl StaticIdentityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry<I, S>(mut self, identifier: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            identifier.into(),
            candidates.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl IdentityLookup for StaticIdentityLookup {
    async fn lookup(&self, identifier: &str) -> std::result::Result<Vec<String>, LookupError> {
        Ok(self.entries.get(identifier).cloned().unwrap_or_default())
    }
}
