//! Pipeline specification documents
//!
//! A pipeline spec holds exactly one top-level entry whose key names the
//! pipeline. Its body carries `title`, `description` and the ordered
//! `pipeline` steps; every other key is kept, in document order, as a free
//! property of the plan.

use crate::error::{ProvError, Result};
use crate::value::scalar_text;
use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Keys of the pipeline body that are modelled explicitly
pub const RECOGNIZED_KEYS: [&str; 3] = ["title", "description", "pipeline"];

/// Key holding a data manager reference
pub const DATA_MANAGER_KEY: &str = "data_manager";

/// A parsed pipeline specification
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    /// The single top-level key
    pub name: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<PipelineStep>,
    /// Unrecognized body entries, in document order
    pub properties: Vec<(String, Value)>,
}

/// One processor invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub run: String,
    /// Declared parameters, in document order
    pub parameters: Vec<(String, Value)>,
}

/// An ORCID reference to a data manager, with an optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataManagerRef {
    pub orcid: String,
    pub name: Option<String>,
}

impl DataManagerRef {
    /// Read a `data_manager` entry from a list of properties
    ///
    /// Matches only when the entry is a mapping with an `orcid` key. A null or
    /// empty ORCID still matches, and resolves to an anonymous agent.
    pub fn from_properties(properties: &[(String, Value)]) -> Option<Self> {
        let (_, value) = properties.iter().find(|(key, _)| key == DATA_MANAGER_KEY)?;
        let mapping = value.as_mapping()?;
        let orcid = mapping.get("orcid")?;
        Some(Self {
            orcid: scalar_text(orcid).unwrap_or_default(),
            name: mapping.get("name").and_then(scalar_text),
        })
    }
}

impl PipelineSpec {
    /// Parse a YAML pipeline spec
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let document: Value = serde_yaml::from_slice(bytes)
            .map_err(|e| ProvError::malformed_spec(format!("invalid YAML: {}", e)))?;
        Self::from_value(&document)
    }

    /// Build a spec from an already parsed document
    pub fn from_value(document: &Value) -> Result<Self> {
        let root = document
            .as_mapping()
            .ok_or_else(|| ProvError::malformed_spec("document is not a mapping"))?;
        if root.len() != 1 {
            return Err(ProvError::malformed_spec(format!(
                "expected exactly one top-level pipeline, found {}",
                root.len()
            )));
        }
        let Some((name, body)) = root.iter().next() else {
            return Err(ProvError::malformed_spec("document is empty"));
        };
        let name = key_text(name)?;
        let body = body.as_mapping().ok_or_else(|| {
            ProvError::malformed_spec(format!("pipeline `{}` is not a mapping", name))
        })?;

        let title = required_text(body, "title")?;
        let description = required_text(body, "description")?;
        let steps = body
            .get("pipeline")
            .ok_or_else(|| ProvError::malformed_spec("missing required field `pipeline`"))?
            .as_sequence()
            .ok_or_else(|| ProvError::malformed_spec("`pipeline` is not a sequence"))?
            .iter()
            .enumerate()
            .map(|(index, step)| PipelineStep::from_value(index, step))
            .collect::<Result<Vec<_>>>()?;

        let mut properties = Vec::new();
        for (key, value) in body {
            let key = key_text(key)?;
            if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                properties.push((key, value.clone()));
            }
        }

        Ok(Self {
            name,
            title,
            description,
            steps,
            properties,
        })
    }

    /// Value of a free property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Text of a scalar free property
    ///
    /// A non-scalar value yields `None` with a warning; the property itself
    /// is still kept as a plan variable.
    pub fn property_text(&self, key: &str) -> Option<String> {
        let value = self.property(key)?;
        let text = scalar_text(value);
        if text.is_none() {
            warn!("Ignoring non-scalar `{}` in pipeline {}", key, self.name);
        }
        text
    }

    /// Pick the data manager for this pipeline
    ///
    /// A spec-level reference takes precedence. Otherwise steps are scanned in
    /// declared order and the first one carrying a reference wins; later steps
    /// are not consulted.
    pub fn data_manager(&self) -> Option<DataManagerRef> {
        DataManagerRef::from_properties(&self.properties).or_else(|| {
            self.steps
                .iter()
                .find_map(|step| DataManagerRef::from_properties(&step.parameters))
        })
    }
}

impl PipelineStep {
    fn from_value(index: usize, value: &Value) -> Result<Self> {
        let step = value
            .as_mapping()
            .ok_or_else(|| ProvError::malformed_spec(format!("step {} is not a mapping", index)))?;
        let run = step
            .get("run")
            .ok_or_else(|| {
                ProvError::malformed_spec(format!("step {} is missing required field `run`", index))
            })
            .and_then(|run| {
                scalar_text(run).ok_or_else(|| {
                    ProvError::malformed_spec(format!("step {}: `run` must be a scalar", index))
                })
            })?;

        let parameters = match step.get("parameters") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(parameters)) => parameters
                .iter()
                .map(|(key, value)| Ok::<_, ProvError>((key_text(key)?, value.clone())))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(ProvError::malformed_spec(format!(
                    "step {}: `parameters` is not a mapping",
                    index
                )))
            }
        };

        Ok(Self { run, parameters })
    }
}

fn key_text(key: &Value) -> Result<String> {
    scalar_text(key).ok_or_else(|| ProvError::malformed_spec("mapping keys must be scalars"))
}

fn required_text(body: &Mapping, field: &str) -> Result<String> {
    let value = body
        .get(field)
        .ok_or_else(|| ProvError::malformed_spec(format!("missing required field `{}`", field)))?;
    scalar_text(value)
        .ok_or_else(|| ProvError::malformed_spec(format!("`{}` must be a scalar", field)))
}
