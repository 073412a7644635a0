//! Runtime configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `DPP2PROV_*` environment variables (nested keys separated by `__`, e.g.
//! `DPP2PROV_LOOKUP__TIMEOUT_SECS=5`). `ENVIRONMENT` is also read on its own
//! so a deployment can name its bucket through `{ENVIRONMENT}_BUCKET`.

use crate::error::{ProvError, Result};
use crate::format::RdfFormat;
use crate::model::NamedNode;
use crate::resolver::DEFAULT_LOOKUP_ENDPOINT;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read when no explicit configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "dpp2prov.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "DPP2PROV_";

/// Configuration for provenance generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvConfig {
    /// Deployment environment, used for the bucket fallback
    pub environment: Option<String>,
    /// Bucket holding dataset versions
    pub bucket: Option<String>,
    /// IRI of the office data managers act on behalf of
    pub office_uri: Option<String>,
    pub storage: StorageConfig,
    pub lookup: LookupConfig,
    /// Format used when a caller names none
    pub default_format: String,
}

/// Where documents are fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// `{root}/{bucket}/{path}` on the local filesystem
    #[default]
    Filesystem,
    /// `{endpoint}/{bucket}/{path}` over HTTP
    Http,
    /// Signed S3 requests with credentials from the environment
    S3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub root: PathBuf,
    /// Base URL for `http` storage; S3-compatible endpoint override for `s3`
    pub endpoint: Option<String>,
    /// S3 region; falls back to `AWS_REGION`
    pub region: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Filesystem,
            root: PathBuf::from("."),
            endpoint: None,
            region: None,
            timeout_secs: 30,
        }
    }
}

/// Identity lookup service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            timeout_secs: 10,
            user_agent: format!("oxirs-prov/{}", crate::VERSION),
        }
    }
}

impl Default for ProvConfig {
    fn default() -> Self {
        Self {
            environment: None,
            bucket: None,
            office_uri: None,
            storage: StorageConfig::default(),
            lookup: LookupConfig::default(),
            default_format: RdfFormat::default().name().to_string(),
        }
    }
}

impl ProvConfig {
    /// Load configuration from defaults, a TOML file and the environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ProvError::configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )))
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        Self::figment(&file)
            .extract()
            .map_err(|e| ProvError::configuration(format!("Failed to load configuration: {}", e)))
    }

    /// The layered provider stack used by [`ProvConfig::load`]
    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(ProvConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::raw().only(&["environment"]))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Name of the bucket to read from
    ///
    /// Falls back to the `{ENVIRONMENT}_BUCKET` variable when no bucket is
    /// configured, trying the environment name as given before its
    /// upper-case form.
    pub fn bucket_name(&self) -> Result<String> {
        if let Some(bucket) = non_blank(self.bucket.as_deref()) {
            return Ok(bucket.to_string());
        }
        let environment = non_blank(self.environment.as_deref()).ok_or_else(|| {
            ProvError::configuration("no bucket configured and ENVIRONMENT is not set")
        })?;
        let exact = format!("{}_BUCKET", environment);
        let upper = exact.to_uppercase();
        let bucket = [&exact, &upper]
            .into_iter()
            .find_map(|variable| {
                std::env::var(variable)
                    .ok()
                    .filter(|bucket| !bucket.trim().is_empty())
            })
            .ok_or_else(|| ProvError::configuration(format!("{} is not set", exact)));
        bucket
    }

    /// IRI of the office
    pub fn office(&self) -> Result<NamedNode> {
        let uri = non_blank(self.office_uri.as_deref())
            .ok_or_else(|| ProvError::configuration("office_uri is not configured"))?;
        NamedNode::new(uri)
            .map_err(|e| ProvError::configuration(format!("office_uri is invalid: {}", e)))
    }

    pub fn default_format(&self) -> Result<RdfFormat> {
        RdfFormat::from_name(Some(&self.default_format))
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.timeout_secs)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = ProvConfig::default();
        assert_eq!(config.storage.kind, StorageKind::Filesystem);
        assert_eq!(config.lookup.endpoint, "https://lod.bco-dmo.org/sparql");
        assert_eq!(config.default_format().unwrap(), RdfFormat::Turtle);
        assert_eq!(config.bucket_name().unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(config.office().unwrap_err().status_code(), 503);
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dpp2prov.toml",
                r#"
                    bucket = "from-file"
                    office_uri = "http://lod.bco-dmo.org/id/affiliation/191"

                    [storage]
                    kind = "http"
                    endpoint = "http://localhost:9000"
                "#,
            )?;
            jail.set_env("DPP2PROV_BUCKET", "from-env");
            jail.set_env("DPP2PROV_LOOKUP__TIMEOUT_SECS", "3");

            let config = ProvConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.bucket_name().map_err(|e| e.to_string())?, "from-env");
            assert_eq!(config.storage.kind, StorageKind::Http);
            assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
            assert_eq!(config.lookup_timeout(), Duration::from_secs(3));
            assert_eq!(
                config.office().map_err(|e| e.to_string())?.as_str(),
                "http://lod.bco-dmo.org/id/affiliation/191"
            );
            Ok(())
        });
    }

    #[test]
    fn test_environment_bucket_fallback() {
        Jail::expect_with(|jail| {
            jail.set_env("ENVIRONMENT", "staging");
            jail.set_env("STAGING_BUCKET", "staging-dpp");

            let config = ProvConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.environment.as_deref(), Some("staging"));
            assert_eq!(config.bucket_name().map_err(|e| e.to_string())?, "staging-dpp");
            Ok(())
        });
    }

    #[test]
    fn test_environment_bucket_keeps_casing() {
        Jail::expect_with(|jail| {
            jail.set_env("ENVIRONMENT", "dev");
            jail.set_env("dev_BUCKET", "dev-dpp");
            jail.set_env("DEV_BUCKET", "shouted-dpp");

            let config = ProvConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.bucket_name().map_err(|e| e.to_string())?, "dev-dpp");
            Ok(())
        });
    }

    #[test]
    fn test_s3_storage() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dpp2prov.toml",
                r#"
                    [storage]
                    kind = "s3"
                    region = "us-west-2"
                "#,
            )?;
            let config = ProvConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.storage.kind, StorageKind::S3);
            assert_eq!(config.storage.region.as_deref(), Some("us-west-2"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = ProvConfig::load(Some(Path::new("/nonexistent/dpp2prov.toml"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
