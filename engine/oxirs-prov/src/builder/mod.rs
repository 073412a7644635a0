//! Provenance graph assembly
//!
//! [`ProvenanceBuilder`] fetches the pipeline spec and the data package
//! manifest of one dataset version, then describes the run as a PROV-O /
//! P-PLAN bundle:
//!
//! - the spec is a `prov:Plan` created by one activity and executed by another
//! - every step is a `plan:Step`, ordered by index and predecessor links
//! - every manifest resource is an entity generated by the executed plan
//! - a single data manager is associated with both activities, acting on
//!   behalf of the configured office
//!
//! Any loader or structural error aborts the whole build.

mod manifest;
mod pipeline;

pub use manifest::{DataPackage, Resource};
pub use pipeline::{
    DataManagerRef, PipelineSpec, PipelineStep, DATA_MANAGER_KEY, RECOGNIZED_KEYS,
};

use crate::config::{ProvConfig, StorageKind};
use crate::error::{ProvError, Result};
use crate::format::RdfFormat;
use crate::graph::{NodeKind, ProvGraph};
use crate::loader::{DocumentLoader, FsDocumentLoader, HttpDocumentLoader, S3DocumentLoader};
use crate::model::{BlankNode, Literal, NamedNode, Subject};
use crate::namespaces::Namespaces;
use crate::resolver::{IdentityResolver, SparqlIdentityLookup};
use crate::serializer;
use crate::value::to_flow_yaml;
use crate::vocab::{odo, plan, prov, rdf, rdfs, schema, xsd, REDMINE_ISSUE_BASE};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Object name of the pipeline spec inside a dataset version
pub const PIPELINE_SPEC_FILE: &str = "pipeline-spec.yaml";
/// Object name of the data package manifest inside a dataset version
pub const DATA_PACKAGE_FILE: &str = "datapackage.json";

const PIPELINE_MEDIA_TYPE: &str = "application/x-yaml";
const DATA_PACKAGE_MEDIA_TYPE: &str = "application/json";
const SOFTWARE_NAME: &str = "Laminar";

/// Storage locations of one dataset version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLocation {
    pub bucket: String,
    pub dataset_id: String,
    pub version_id: String,
}

impl DatasetLocation {
    pub fn new(
        bucket: impl Into<String>,
        dataset_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            dataset_id: dataset_id.into(),
            version_id: version_id.into(),
        }
    }

    /// `{dataset}/{version}/data/`
    pub fn root_path(&self) -> String {
        format!("{}/{}/data/", self.dataset_id, self.version_id)
    }

    pub fn pipeline_path(&self) -> String {
        format!("{}{}", self.root_path(), PIPELINE_SPEC_FILE)
    }

    pub fn manifest_path(&self) -> String {
        format!("{}{}", self.root_path(), DATA_PACKAGE_FILE)
    }

    pub fn pipeline_url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.pipeline_path())
    }

    pub fn manifest_url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.manifest_path())
    }
}

/// Builds provenance graphs for dataset versions
#[derive(Clone)]
pub struct ProvenanceBuilder {
    loader: Arc<dyn DocumentLoader>,
    resolver: IdentityResolver,
    bucket: String,
    office: NamedNode,
    namespaces: Namespaces,
    default_format: RdfFormat,
}

impl std::fmt::Debug for ProvenanceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvenanceBuilder")
            .field("resolver", &self.resolver)
            .field("bucket", &self.bucket)
            .field("office", &self.office)
            .field("default_format", &self.default_format)
            .finish_non_exhaustive()
    }
}

impl ProvenanceBuilder {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        resolver: IdentityResolver,
        bucket: impl Into<String>,
        office: NamedNode,
    ) -> Self {
        Self {
            loader,
            resolver,
            bucket: bucket.into(),
            office,
            namespaces: Namespaces::provenance(),
            default_format: RdfFormat::default(),
        }
    }

    /// Wire a builder from configuration
    ///
    /// Fails with [`ProvError::Configuration`] when the bucket, the office IRI
    /// or a collaborator endpoint is missing.
    pub fn from_config(config: &ProvConfig) -> Result<Self> {
        let bucket = config.bucket_name()?;
        let office = config.office()?;
        let default_format = config.default_format()?;

        let loader: Arc<dyn DocumentLoader> = match config.storage.kind {
            StorageKind::Filesystem => Arc::new(FsDocumentLoader::new(&config.storage.root)),
            StorageKind::Http => {
                let endpoint = config.storage.endpoint.as_deref().ok_or_else(|| {
                    ProvError::configuration("storage.endpoint is required for http storage")
                })?;
                Arc::new(HttpDocumentLoader::new(endpoint, config.storage_timeout())?)
            }
            StorageKind::S3 => Arc::new(S3DocumentLoader::from_env(
                config.storage.region.as_deref(),
                config.storage.endpoint.as_deref(),
                config.storage_timeout(),
            )),
        };

        let lookup = SparqlIdentityLookup::new(
            config.lookup.endpoint.as_str(),
            config.lookup_timeout(),
            &config.lookup.user_agent,
        )?;
        let resolver =
            IdentityResolver::new(Arc::new(lookup)).with_timeout(config.lookup_timeout());

        Ok(Self::new(loader, resolver, bucket, office).with_default_format(default_format))
    }

    pub fn with_default_format(mut self, format: RdfFormat) -> Self {
        self.default_format = format;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn office(&self) -> &NamedNode {
        &self.office
    }

    pub fn default_format(&self) -> RdfFormat {
        self.default_format
    }

    /// Resolve a caller-supplied format name against this builder's default
    pub fn resolve_format(&self, name: Option<&str>) -> Result<RdfFormat> {
        match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.parse(),
            None => Ok(self.default_format),
        }
    }

    /// Build and serialize the provenance of one dataset version
    ///
    /// The format is validated before anything is fetched.
    pub async fn generate(
        &self,
        dataset_id: &str,
        version_id: &str,
        format: Option<&str>,
    ) -> Result<String> {
        let format = self.resolve_format(format)?;
        info!(
            "Got dataset, version and RDF format: {}:{}:{}",
            dataset_id, version_id, format
        );
        let graph = self.build(dataset_id, version_id).await?;
        serializer::serialize(&graph, format)
    }

    /// Build the provenance graph of one dataset version
    pub async fn build(&self, dataset_id: &str, version_id: &str) -> Result<ProvGraph> {
        let location = DatasetLocation::new(&self.bucket, dataset_id, version_id);
        let pipeline_path = location.pipeline_path();
        let manifest_path = location.manifest_path();

        let (spec_doc, manifest_doc) = tokio::try_join!(
            self.loader.fetch(&location.bucket, &pipeline_path),
            self.loader.fetch(&location.bucket, &manifest_path),
        )?;
        debug!(
            "Fetched {} ({} bytes) and {} ({} bytes)",
            pipeline_path,
            spec_doc.bytes.len(),
            manifest_path,
            manifest_doc.bytes.len()
        );

        let spec = PipelineSpec::parse(&spec_doc.bytes)?;
        let package = DataPackage::parse(&manifest_doc.bytes)?;
        self.assemble(&location, &spec, &package, spec_doc.last_modified)
            .await
    }

    /// Describe a parsed spec and manifest as a provenance graph
    pub async fn assemble(
        &self,
        location: &DatasetLocation,
        spec: &PipelineSpec,
        package: &DataPackage,
        generated_at: DateTime<Utc>,
    ) -> Result<ProvGraph> {
        let mut graph = ProvGraph::new(self.namespaces.clone());
        let bundle = graph.bundle();
        graph.insert(
            bundle,
            &prov::GENERATED_AT_TIME,
            Literal::new_typed(
                generated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                xsd::DATE_TIME.clone(),
            ),
        );

        // Plan
        let plan_node = graph.mint(NodeKind::Plan);
        graph.insert_types(
            plan_node,
            &[&prov::PLAN, &prov::COLLECTION, &schema::DIGITAL_DOCUMENT],
        );
        graph.insert(plan_node, &schema::NAME, Literal::string(&spec.title));
        graph.insert(
            plan_node,
            &schema::DESCRIPTION,
            Literal::string(&spec.description),
        );
        graph.insert(
            plan_node,
            &schema::CONTENT_URL,
            Literal::any_uri(location.pipeline_url()),
        );
        graph.insert(
            plan_node,
            &schema::ENCODING_FORMAT,
            Literal::token(PIPELINE_MEDIA_TYPE),
        );
        for (key, value) in &spec.properties {
            let variable = add_variable(&mut graph, key, value);
            graph.insert(plan_node, &plan::IS_VARIABLE_OF_PLAN, variable);
        }

        // Influences
        if let Some(issue) = spec.property_text("redmineIssueNumber") {
            match redmine_issue(&issue) {
                Ok(issue_node) => {
                    graph.insert(plan_node, &prov::WAS_INFLUENCED_BY, &issue_node);
                    graph.attach_identifier(
                        &issue_node,
                        &issue,
                        None,
                        &odo::REDMINE_ISSUE_IDENTIFIER,
                    );
                }
                Err(e) => warn!("Skipping Redmine issue {:?}: {}", issue, e),
            }
        }
        if let Some(submission_id) = spec.property_text("submissionId") {
            let submission = graph.mint(NodeKind::Submission);
            graph.insert(submission, &rdf::TYPE, &*prov::COLLECTION);
            graph.attach_identifier(
                submission,
                &submission_id,
                None,
                &odo::SUBMISSION_IDENTIFIER,
            );
            graph.insert(plan_node, &prov::WAS_INFLUENCED_BY, submission);
        }

        // Activities
        let created = graph.mint(NodeKind::Activity);
        graph.insert_types(created, &[&prov::ACTIVITY, &schema::CREATE_ACTION]);
        graph.insert(created, &prov::GENERATED, plan_node);
        let creation = qualify_association(&mut graph, created, plan_node);
        graph.insert(plan_node, &prov::WAS_GENERATED_BY, created);

        let executed = graph.mint(NodeKind::Activity);
        graph.insert_types(executed, &[&prov::ACTIVITY, &schema::PLAY_ACTION]);
        graph.insert(executed, &prov::HAD_PLAN, plan_node);
        graph.insert(executed, &prov::USED, plan_node);
        graph.insert(executed, &prov::WAS_INFORMED_BY, created);
        let execution = qualify_association(&mut graph, executed, plan_node);

        if let Some(version) = spec.property_text("version") {
            let software = graph.mint(NodeKind::Software);
            graph.insert_types(software, &[&schema::SOFTWARE_SOURCE_CODE, &prov::ENTITY]);
            graph.insert(software, &schema::NAME, Literal::string(SOFTWARE_NAME));
            graph.insert(software, &schema::VERSION, Literal::token(version));
            graph.insert(created, &prov::USED, software);
            graph.insert(executed, &prov::USED, software);
        }

        // Data manager
        let data_manager = spec.data_manager();
        let agent = self
            .resolver
            .resolve(
                &mut graph,
                data_manager.as_ref().map(|dm| dm.orcid.as_str()),
                data_manager.as_ref().and_then(|dm| dm.name.as_deref()),
            )
            .await;

        let delegation = graph.mint(NodeKind::Delegation);
        graph.insert(delegation, &rdf::TYPE, &*prov::DELEGATION);
        graph.insert(delegation, &prov::AGENT, &self.office);
        graph.insert(delegation, &prov::HAD_ROLE, &*odo::DATA_MANAGER_ROLE);
        graph.insert(delegation, &prov::HAD_ACTIVITY, created);
        graph.insert(delegation, &prov::HAD_ACTIVITY, executed);

        // Steps
        let mut previous: Option<BlankNode> = None;
        for (order, step) in spec.steps.iter().enumerate() {
            let step_node = graph.mint(NodeKind::Step);
            graph.insert(step_node, &rdf::TYPE, &*plan::STEP);
            graph.insert(step_node, &rdfs::LABEL, Literal::token(&step.run));
            graph.insert(step_node, &plan::IS_STEP_OF_PLAN, plan_node);
            graph.insert(step_node, &rdf::VALUE, Literal::integer(order as i64));
            for (name, value) in &step.parameters {
                let variable = add_variable(&mut graph, name, value);
                graph.insert(step_node, &plan::HAS_INPUT_VAR, variable);
            }
            if let Some(previous) = previous {
                graph.insert(step_node, &plan::IS_PRECEDED_BY, previous);
            }
            previous = Some(step_node);
        }

        graph.insert(bundle, &prov::WAS_ATTRIBUTED_TO, &agent);
        graph.insert(plan_node, &prov::WAS_ATTRIBUTED_TO, &agent);
        graph.insert(&agent, &rdf::TYPE, &*prov::PERSON);
        graph.insert(&agent, &prov::QUALIFIED_DELEGATION, delegation);
        graph.insert(created, &prov::WAS_ASSOCIATED_WITH, &agent);
        graph.insert(creation, &prov::AGENT, &agent);
        graph.insert(executed, &prov::WAS_ASSOCIATED_WITH, &agent);
        graph.insert(execution, &prov::AGENT, &agent);

        // Outputs
        let data_package = graph.mint(NodeKind::DataPackage);
        graph.insert_types(data_package, &[&prov::ENTITY, &schema::DIGITAL_DOCUMENT]);
        graph.insert(data_package, &prov::WAS_GENERATED_BY, executed);
        graph.insert(data_package, &prov::WAS_ATTRIBUTED_TO, &agent);
        graph.insert(
            data_package,
            &schema::CONTENT_URL,
            Literal::any_uri(location.manifest_url()),
        );
        graph.insert(
            data_package,
            &schema::ENCODING_FORMAT,
            Literal::token(DATA_PACKAGE_MEDIA_TYPE),
        );

        let root_path = location.root_path();
        for resource in &package.resources {
            add_resource(&mut graph, &root_path, resource, created, executed, &agent);
        }

        debug!(
            "Assembled {} triples over {} nodes for {}",
            graph.len(),
            graph.node_count(),
            root_path
        );
        Ok(graph)
    }
}

/// IRI of a Redmine issue, percent-encoding the issue number
fn redmine_issue(issue: &str) -> Result<NamedNode> {
    NamedNode::new(format!(
        "{}{}",
        REDMINE_ISSUE_BASE,
        urlencoding::encode(issue.trim())
    ))
}

/// Mint a variable carrying `key` and the flow-YAML form of `value`
fn add_variable(graph: &mut ProvGraph, key: &str, value: &serde_yaml::Value) -> BlankNode {
    let variable = graph.mint(NodeKind::Variable);
    graph.insert(variable, &rdf::TYPE, &*plan::VARIABLE);
    graph.insert(variable, &rdfs::LABEL, Literal::token(key));
    graph.insert(
        variable,
        &rdf::VALUE,
        Literal::new_typed(to_flow_yaml(value), odo::YAML_LITERAL.clone()),
    );
    variable
}

/// Attach a data manager association for `plan_node` to `activity`
fn qualify_association(
    graph: &mut ProvGraph,
    activity: BlankNode,
    plan_node: BlankNode,
) -> BlankNode {
    let association = graph.mint(NodeKind::Association);
    graph.insert(association, &rdf::TYPE, &*prov::ASSOCIATION);
    graph.insert(activity, &prov::QUALIFIED_ASSOCIATION, association);
    graph.insert(association, &prov::HAD_ROLE, &*odo::DATA_MANAGER_ROLE);
    graph.insert(association, &prov::HAD_PLAN, plan_node);
    association
}

fn add_resource(
    graph: &mut ProvGraph,
    root_path: &str,
    resource: &Resource,
    created: BlankNode,
    executed: BlankNode,
    agent: &Subject,
) {
    let data = graph.mint(NodeKind::ProcessedData);
    graph.insert_types(data, &[&prov::ENTITY, &schema::DATA_DOWNLOAD]);
    graph.insert(data, &prov::WAS_GENERATED_BY, executed);
    graph.insert(data, &prov::WAS_ATTRIBUTED_TO, agent);
    graph.insert(
        data,
        &schema::NAME,
        Literal::string(format!("{}{}", root_path, resource.name)),
    );
    graph.insert(
        data,
        &schema::CONTENT_URL,
        Literal::any_uri(format!("{}{}", root_path, resource.path)),
    );
    graph.insert(data, &schema::ENCODING_FORMAT, Literal::token(&resource.format));

    if let Some(source) = &resource.streamed_from {
        let raw = graph.mint(NodeKind::RawData);
        graph.insert_types(raw, &[&prov::ENTITY, &schema::DATA_DOWNLOAD]);
        graph.insert(created, &prov::USED, raw);
        graph.insert(raw, &schema::CONTENT_URL, Literal::any_uri(source));
        graph.insert(data, &prov::WAS_DERIVED_FROM, raw);
        graph.insert(data, &prov::HAD_PRIMARY_SOURCE, raw);
        graph.insert(data, &prov::WAS_REVISION_OF, raw);
    }
}
