//! Authenticated S3 adapter

use super::{denied, not_found, transient, Document, DocumentLoader};
use crate::error::{ProvError, Result};
use async_trait::async_trait;
use aws_config::environment::credentials::EnvironmentVariableCredentialsProvider;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, SharedCredentialsProvider};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Region used when neither the configuration nor the environment names one
const DEFAULT_REGION: &str = "us-east-1";

/// Loads objects with signed S3 `GetObject` requests
#[derive(Debug, Clone)]
pub struct S3DocumentLoader {
    client: Client,
}

impl S3DocumentLoader {
    /// Create a loader whose credentials come from `AWS_ACCESS_KEY_ID`,
    /// `AWS_SECRET_ACCESS_KEY` and, when set, `AWS_SESSION_TOKEN`
    ///
    /// `region` falls back to `AWS_REGION`, `AWS_DEFAULT_REGION`, then
    /// [`DEFAULT_REGION`]. An `endpoint` selects an S3-compatible store
    /// addressed path-style.
    pub fn from_env(region: Option<&str>, endpoint: Option<&str>, timeout: Duration) -> Self {
        let provider = SharedCredentialsProvider::new(EnvironmentVariableCredentialsProvider::new());
        Self::with_provider(provider, region, endpoint, timeout)
    }

    /// Create a loader with fixed credentials
    pub fn with_credentials(
        credentials: Credentials,
        region: Option<&str>,
        endpoint: Option<&str>,
        timeout: Duration,
    ) -> Self {
        Self::with_provider(
            SharedCredentialsProvider::new(credentials),
            region,
            endpoint,
            timeout,
        )
    }

    fn with_provider(
        provider: SharedCredentialsProvider,
        region: Option<&str>,
        endpoint: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let mut config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(resolve_region(region)))
            .credentials_provider(provider)
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
        if let Some(endpoint) = endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            config = config.endpoint_url(endpoint).force_path_style(true);
        }
        Self::from_client(Client::from_conf(config.build()))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn resolve_region(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(["AWS_REGION", "AWS_DEFAULT_REGION"].iter().filter_map(|var| std::env::var(var).ok()))
        .map(|region| region.trim().to_string())
        .find(|region| !region.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

#[async_trait]
impl DocumentLoader for S3DocumentLoader {
    async fn fetch(&self, bucket: &str, path: &str) -> Result<Document> {
        debug!("Getting s3://{}/{}", bucket, path);
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| get_object_error(bucket, path, e))?;

        let last_modified = output
            .last_modified()
            .and_then(|time| DateTime::<Utc>::from_timestamp(time.secs(), time.subsec_nanos()))
            .unwrap_or_else(Utc::now);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| transient(bucket, path, e))?
            .into_bytes();

        Ok(Document {
            bytes: bytes.to_vec(),
            last_modified,
        })
    }
}

fn get_object_error(bucket: &str, path: &str, error: SdkError<GetObjectError>) -> ProvError {
    let no_such_key = error
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key);
    let status = error.raw_response().map(|response| response.status().as_u16());
    classify_failure(
        bucket,
        path,
        no_such_key,
        status,
        DisplayErrorContext(&error).to_string(),
    )
}

/// Map a failed `GetObject` onto the loader error kinds
fn classify_failure(
    bucket: &str,
    path: &str,
    no_such_key: bool,
    status: Option<u16>,
    message: String,
) -> ProvError {
    match (no_such_key, status) {
        (true, _) | (false, Some(404)) => not_found(bucket, path),
        (false, Some(401 | 403)) => denied(bucket, path),
        _ => transient(bucket, path, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_failure_classification() {
        let kind = |no_such_key, status| {
            classify_failure("b", "k", no_such_key, status, "boom".to_string()).kind()
        };
        assert_eq!(kind(true, Some(404)), ErrorKind::InputNotFound);
        assert_eq!(kind(true, None), ErrorKind::InputNotFound);
        assert_eq!(kind(false, Some(404)), ErrorKind::InputNotFound);
        assert_eq!(kind(false, Some(403)), ErrorKind::AccessDenied);
        assert_eq!(kind(false, Some(401)), ErrorKind::AccessDenied);
        assert_eq!(kind(false, Some(503)), ErrorKind::TransientIo);
        assert_eq!(kind(false, None), ErrorKind::TransientIo);
    }

    #[test]
    fn test_configured_region_wins() {
        assert_eq!(resolve_region(Some("eu-west-1")), "eu-west-1");
    }
}
