//! Identity lookup against a SPARQL endpoint

use super::{IdentityLookup, LookupError};
use crate::error::{ProvError, Result};
use crate::vocab::{odo, xsd};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default endpoint of the person registry
pub const DEFAULT_ENDPOINT: &str = "https://lod.bco-dmo.org/sparql";

/// SPARQL Results JSON document, reduced to what candidate extraction reads
#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: ResultsBody,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    bindings: Vec<HashMap<String, BindingValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BindingValue {
    Uri {
        value: String,
    },
    Literal {
        #[allow(dead_code)]
        value: String,
    },
    Bnode {
        #[allow(dead_code)]
        value: String,
    },
    #[serde(rename = "typed-literal")]
    TypedLiteral {
        #[allow(dead_code)]
        value: String,
    },
}

/// Looks up people by ORCID in a SPARQL endpoint
///
/// Sends `GET {endpoint}?query=…&output=json` and reads the `person` column
/// of the result set.
#[derive(Debug, Clone)]
pub struct SparqlIdentityLookup {
    client: Client,
    endpoint: String,
}

impl SparqlIdentityLookup {
    /// Create a lookup client
    ///
    /// The endpoint is required; a blank one is a configuration error.
    pub fn new(endpoint: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(ProvError::configuration(
                "identity lookup endpoint is not configured",
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProvError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The query selecting people registered under `orcid`
    pub fn query_for(orcid: &str) -> String {
        format!(
            "PREFIX odo: <{odo}>\n\
             PREFIX xsd: <{xsd}>\n\
             SELECT DISTINCT ?person WHERE {{ \
             ?person odo:identifier ?id . \
             ?id odo:identifierScheme odo:IdentifierScheme_ORCID . \
             ?id odo:identifierValue \"{value}\"^^xsd:token }}",
            odo = odo::NAMESPACE,
            xsd = xsd::NAMESPACE,
            value = escape_sparql_string(orcid),
        )
    }
}

#[async_trait]
impl IdentityLookup for SparqlIdentityLookup {
    async fn lookup(&self, identifier: &str) -> std::result::Result<Vec<String>, LookupError> {
        let query = Self::query_for(identifier);
        debug!("Looking up ORCID {} at {}", identifier, self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/sparql-results+json")
            .query(&[("query", query.as_str()), ("output", "json")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Transport(format!("request timed out: {}", e))
                } else {
                    LookupError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Transport(format!(
                "endpoint answered HTTP {}",
                status
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let candidates = parse_candidates(&body)?;
        debug!("ORCID {} has {} candidate(s)", identifier, candidates.len());
        Ok(candidates)
    }
}

/// Extract `person` IRIs from a SPARQL Results JSON body, in result order
pub fn parse_candidates(body: &str) -> std::result::Result<Vec<String>, LookupError> {
    let results: SparqlResults = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(e.to_string()))?;

    Ok(results
        .results
        .bindings
        .into_iter()
        .filter_map(|mut row| match row.remove("person") {
            Some(BindingValue::Uri { value }) => Some(value),
            _ => None,
        })
        .collect())
}

fn escape_sparql_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}
