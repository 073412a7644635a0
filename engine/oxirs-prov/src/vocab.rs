//! Vocabularies used in provenance bundles
//!
//! PROV-O, P-PLAN, schema.org and the ocean-data ontology, plus the parts of
//! RDF, RDFS and XSD the bundles rely on.

use crate::model::NamedNode;
use std::sync::LazyLock;

macro_rules! terms {
    ($($(#[$doc:meta])* $name:ident => $local:literal;)*) => {
        $(
            $(#[$doc])*
            pub static $name: LazyLock<NamedNode> =
                LazyLock::new(|| NamedNode::new_unchecked(format!("{}{}", NAMESPACE, $local)));
        )*
    };
}

/// RDF vocabulary namespace
pub mod rdf {
    use super::*;

    /// The RDF namespace IRI
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    terms! {
        /// rdf:type predicate
        TYPE => "type";
        /// rdf:value predicate
        VALUE => "value";
    }
}

/// RDF Schema vocabulary namespace
pub mod rdfs {
    use super::*;

    /// The RDFS namespace IRI
    pub const NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";

    terms! {
        /// rdfs:isDefinedBy predicate
        IS_DEFINED_BY => "isDefinedBy";
        /// rdfs:label predicate
        LABEL => "label";
    }
}

/// XML Schema datatypes vocabulary namespace
pub mod xsd {
    use super::*;

    /// The XSD namespace IRI
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

    terms! {
        STRING => "string";
        TOKEN => "token";
        ANY_URI => "anyURI";
        INTEGER => "integer";
        DATE_TIME => "dateTime";
    }
}

/// Dublin Core terms (bound as a prefix only)
pub mod dcterms {
    /// The DC terms namespace IRI
    pub const NAMESPACE: &str = "http://purl.org/dc/terms/";
}

/// PROV-O
pub mod prov {
    use super::*;

    /// The PROV namespace IRI
    pub const NAMESPACE: &str = "http://www.w3.org/ns/prov#";

    terms! {
        BUNDLE => "Bundle";
        PLAN => "Plan";
        COLLECTION => "Collection";
        ENTITY => "Entity";
        ACTIVITY => "Activity";
        ASSOCIATION => "Association";
        DELEGATION => "Delegation";
        PERSON => "Person";
        GENERATED_AT_TIME => "generatedAtTime";
        WAS_GENERATED_BY => "wasGeneratedBy";
        GENERATED => "generated";
        USED => "used";
        WAS_INFORMED_BY => "wasInformedBy";
        WAS_INFLUENCED_BY => "wasInfluencedBy";
        WAS_ATTRIBUTED_TO => "wasAttributedTo";
        WAS_ASSOCIATED_WITH => "wasAssociatedWith";
        QUALIFIED_ASSOCIATION => "qualifiedAssociation";
        QUALIFIED_DELEGATION => "qualifiedDelegation";
        HAD_ROLE => "hadRole";
        HAD_PLAN => "hadPlan";
        HAD_ACTIVITY => "hadActivity";
        AGENT => "agent";
        WAS_DERIVED_FROM => "wasDerivedFrom";
        HAD_PRIMARY_SOURCE => "hadPrimarySource";
        WAS_REVISION_OF => "wasRevisionOf";
    }
}

/// P-PLAN
pub mod plan {
    use super::*;

    /// The P-PLAN namespace IRI
    pub const NAMESPACE: &str = "http://purl.org/net/p-plan#";

    terms! {
        STEP => "Step";
        VARIABLE => "Variable";
        IS_STEP_OF_PLAN => "isStepOfPlan";
        IS_VARIABLE_OF_PLAN => "isVariableOfPlan";
        HAS_INPUT_VAR => "hasInputVar";
        IS_PRECEDED_BY => "isPrecededBy";
    }
}

/// schema.org
pub mod schema {
    use super::*;

    /// The schema.org namespace IRI
    pub const NAMESPACE: &str = "http://schema.org/";

    terms! {
        DIGITAL_DOCUMENT => "DigitalDocument";
        DATA_DOWNLOAD => "DataDownload";
        CREATE_ACTION => "CreateAction";
        PLAY_ACTION => "PlayAction";
        SOFTWARE_SOURCE_CODE => "SoftwareSourceCode";
        NAME => "name";
        DESCRIPTION => "description";
        CONTENT_URL => "contentUrl";
        ENCODING_FORMAT => "encodingFormat";
        VERSION => "version";
    }
}

/// Ocean Data Ontology
pub mod odo {
    use super::*;

    /// The ODO namespace IRI
    pub const NAMESPACE: &str = "http://ocean-data.org/schema/";

    terms! {
        /// odo:identifier predicate (subject → identifier node)
        IDENTIFIER => "identifier";
        /// odo:Identifier class
        IDENTIFIER_TYPE => "Identifier";
        IDENTIFIER_SCHEME => "identifierScheme";
        IDENTIFIER_VALUE => "identifierValue";
        IDENTIFIER_SCHEME_ORCID => "IdentifierScheme_ORCID";
        REDMINE_ISSUE_IDENTIFIER => "RedmineIssueIdentifier";
        SUBMISSION_IDENTIFIER => "SubmissionIdentifier";
        /// Datatype of flow-style YAML variable values
        YAML_LITERAL => "yamlLiteral";
        DATA_MANAGER_ROLE => "BcoDmoDataManagerRole";
    }
}

/// Base IRI of Redmine issues referenced by pipeline specs
pub const REDMINE_ISSUE_BASE: &str = "https://d2rq.bco-dmo.org/id/redmine/issue/";
