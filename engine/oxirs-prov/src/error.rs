//! Error types for provenance generation

use std::fmt;

/// Core error type for provenance operations
///
/// Every variant is fatal for the invocation that produced it. Identity lookup
/// failures are not represented here: they are absorbed by the resolver.
#[derive(Debug, thiserror::Error)]
pub enum ProvError {
    #[error("Object not found: s3://{bucket}/{path}")]
    InputNotFound { bucket: String, path: String },
    #[error("Access denied to s3://{bucket}/{path}")]
    AccessDenied { bucket: String, path: String },
    #[error("Transient I/O error fetching s3://{bucket}/{path}: {message}")]
    TransientIo {
        bucket: String,
        path: String,
        message: String,
    },
    #[error("Malformed pipeline spec: {0}")]
    MalformedSpec(String),
    #[error("Malformed data package manifest: {0}")]
    MalformedManifest(String),
    #[error("Unsupported RDF format: {0}")]
    UnsupportedFormat(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid IRI <{iri}>: {message}")]
    InvalidIri { iri: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable classification of a [`ProvError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputNotFound,
    AccessDenied,
    TransientIo,
    MalformedSpec,
    MalformedManifest,
    UnsupportedFormat,
    Configuration,
    InvalidIri,
    Serialization,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputNotFound => "input_not_found",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::MalformedSpec => "malformed_spec",
            ErrorKind::MalformedManifest => "malformed_manifest",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidIri => "invalid_iri",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvError::InputNotFound { .. } => ErrorKind::InputNotFound,
            ProvError::AccessDenied { .. } => ErrorKind::AccessDenied,
            ProvError::TransientIo { .. } => ErrorKind::TransientIo,
            ProvError::MalformedSpec(_) => ErrorKind::MalformedSpec,
            ProvError::MalformedManifest(_) => ErrorKind::MalformedManifest,
            ProvError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ProvError::Configuration(_) => ErrorKind::Configuration,
            ProvError::InvalidIri { .. } => ErrorKind::InvalidIri,
            ProvError::Serialization(_) => ErrorKind::Serialization,
            ProvError::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status code reported by the invocation surface
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Configuration => 503,
            ErrorKind::UnsupportedFormat => 400,
            ErrorKind::InputNotFound => 404,
            ErrorKind::AccessDenied => 403,
            _ => 500,
        }
    }

    pub fn malformed_spec(message: impl Into<String>) -> Self {
        ProvError::MalformedSpec(message.into())
    }

    pub fn malformed_manifest(message: impl Into<String>) -> Self {
        ProvError::MalformedManifest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ProvError::Configuration(message.into())
    }

    pub fn serialization(message: impl fmt::Display) -> Self {
        ProvError::Serialization(message.to_string())
    }
}

/// Result type alias for provenance operations
pub type Result<T> = std::result::Result<T, ProvError>;
