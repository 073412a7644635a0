//! Retrieval of pipeline documents from object storage
//!
//! A [`DocumentLoader`] maps a `bucket` plus object path to the raw bytes and
//! the last-modified time of that object. Four adapters are provided:
//!
//! - [`S3DocumentLoader`]: signed S3 `GetObject` with environment credentials
//! - [`FsDocumentLoader`]: buckets are sub-directories of a local root
//! - [`HttpDocumentLoader`]: unsigned path-style `GET {endpoint}/{bucket}/{path}`
//! - [`MemoryDocumentLoader`]: fixed documents, for replay and tests

use crate::error::{ProvError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::debug;

mod s3;

pub use s3::S3DocumentLoader;

/// A fetched object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub last_modified: DateTime<Utc>,
}

impl Document {
    pub fn new(bytes: impl Into<Vec<u8>>, last_modified: DateTime<Utc>) -> Self {
        Self {
            bytes: bytes.into(),
            last_modified,
        }
    }
}

/// Source of pipeline documents
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fetch one object
    ///
    /// Fails with [`ProvError::InputNotFound`], [`ProvError::AccessDenied`]
    /// or [`ProvError::TransientIo`].
    async fn fetch(&self, bucket: &str, path: &str) -> Result<Document>;
}

fn transient(bucket: &str, path: &str, message: impl ToString) -> ProvError {
    ProvError::TransientIo {
        bucket: bucket.to_string(),
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn not_found(bucket: &str, path: &str) -> ProvError {
    ProvError::InputNotFound {
        bucket: bucket.to_string(),
        path: path.to_string(),
    }
}

fn denied(bucket: &str, path: &str) -> ProvError {
    ProvError::AccessDenied {
        bucket: bucket.to_string(),
        path: path.to_string(),
    }
}

/// Loads objects from `{root}/{bucket}/{path}`
#[derive(Debug, Clone)]
pub struct FsDocumentLoader {
    root: PathBuf,
}

impl FsDocumentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object to a file, refusing keys that escape the bucket
    fn locate(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let key = Path::new(path);
        let escapes = [Path::new(bucket), key].iter().any(|part| {
            part.components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        });
        if escapes || bucket.is_empty() {
            return Err(denied(bucket, path));
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl DocumentLoader for FsDocumentLoader {
    async fn fetch(&self, bucket: &str, path: &str) -> Result<Document> {
        let file = self.locate(bucket, path)?;
        debug!("Reading {} from {}", path, file.display());

        let map_io = |e: std::io::Error| match e.kind() {
            IoErrorKind::NotFound => not_found(bucket, path),
            IoErrorKind::PermissionDenied => denied(bucket, path),
            _ => transient(bucket, path, e),
        };

        let metadata = tokio::fs::metadata(&file).await.map_err(map_io)?;
        if !metadata.is_file() {
            return Err(not_found(bucket, path));
        }
        let bytes = tokio::fs::read(&file).await.map_err(map_io)?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Document {
            bytes,
            last_modified,
        })
    }
}

/// Loads objects over HTTP from a path-style object store endpoint
#[derive(Debug, Clone)]
pub struct HttpDocumentLoader {
    client: Client,
    endpoint: String,
}

impl HttpDocumentLoader {
    /// Create a loader for `endpoint` with a request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("oxirs-prov/{}", crate::VERSION))
            .build()
            .map_err(|e| {
                ProvError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        let key = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}/{}", self.endpoint, urlencoding::encode(bucket), key)
    }
}

#[async_trait]
impl DocumentLoader for HttpDocumentLoader {
    async fn fetch(&self, bucket: &str, path: &str) -> Result<Document> {
        let url = self.object_url(bucket, path);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transient(bucket, path, e))?;

        status_error(response.status(), bucket, path)?;
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date)
            .unwrap_or_else(Utc::now);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transient(bucket, path, e))?;

        Ok(Document {
            bytes: bytes.to_vec(),
            last_modified,
        })
    }
}

/// Classify a non-success response status
fn status_error(status: StatusCode, bucket: &str, path: &str) -> Result<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(not_found(bucket, path)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(denied(bucket, path)),
        s => Err(transient(bucket, path, format!("HTTP status {s}"))),
    }
}

/// Parse an HTTP `Last-Modified` value
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Serves documents registered up front
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentLoader {
    documents: HashMap<(String, String), Document>,
}

impl MemoryDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bucket: impl Into<String>, path: impl Into<String>, document: Document) {
        self.documents.insert((bucket.into(), path.into()), document);
    }

    /// Builder-style [`MemoryDocumentLoader::insert`]
    pub fn with_document(
        mut self,
        bucket: impl Into<String>,
        path: impl Into<String>,
        document: Document,
    ) -> Self {
        self.insert(bucket, path, document);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentLoader for MemoryDocumentLoader {
    async fn fetch(&self, bucket: &str, path: &str) -> Result<Document> {
        self.documents
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| not_found(bucket, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_loader_reads_object() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("bucket/ds/1/data");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("pipeline-spec.yaml"), b"x: 1\n").unwrap();

        let loader = FsDocumentLoader::new(root.path());
        let document = loader
            .fetch("bucket", "ds/1/data/pipeline-spec.yaml")
            .await
            .unwrap();
        assert_eq!(document.bytes, b"x: 1\n");
        assert!(document.last_modified <= Utc::now());
    }

    #[tokio::test]
    async fn test_fs_loader_missing_object() {
        let root = TempDir::new().unwrap();
        let loader = FsDocumentLoader::new(root.path());
        let err = loader.fetch("bucket", "nope.json").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_fs_loader_rejects_traversal() {
        let root = TempDir::new().unwrap();
        let loader = FsDocumentLoader::new(root.path());
        let err = loader.fetch("bucket", "../secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        let err = loader.fetch("..", "secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_memory_loader() {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let loader =
            MemoryDocumentLoader::new().with_document("b", "k", Document::new("data", when));
        let document = loader.fetch("b", "k").await.unwrap();
        assert_eq!(document.bytes, b"data");
        assert_eq!(document.last_modified, when);
        assert_eq!(
            loader.fetch("b", "other").await.unwrap_err().kind(),
            ErrorKind::InputNotFound
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_error(StatusCode::OK, "b", "k").is_ok());
        let kind = |s| status_error(s, "b", "k").unwrap_err().kind();
        assert_eq!(kind(StatusCode::NOT_FOUND), ErrorKind::InputNotFound);
        assert_eq!(kind(StatusCode::FORBIDDEN), ErrorKind::AccessDenied);
        assert_eq!(kind(StatusCode::UNAUTHORIZED), ErrorKind::AccessDenied);
        assert_eq!(kind(StatusCode::BAD_GATEWAY), ErrorKind::TransientIo);
    }

    #[test]
    fn test_http_date() {
        let parsed = parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_object_url() {
        let loader =
            HttpDocumentLoader::new("http://localhost:9000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            loader.object_url("bucket", "ds 1/1/data/datapackage.json"),
            "http://localhost:9000/bucket/ds%201/1/data/datapackage.json"
        );
    }
}
