//! HTTP invocation surface
//!
//! `GET /prov?dataset_id=..&version_id=..[&rdf_format=..]` answers with
//! `{"format": .., "media_type": .., "prov": ..}`; failures answer with `{"error": .., "kind": ..}`
//! and the status code of the underlying error.

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use oxirs_prov::{ProvError, ProvenanceBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Variable that pauses provenance generation when set
pub const PAUSE_VAR: &str = "PAUSE";

/// Shared request state
#[derive(Debug, Clone)]
pub struct AppState {
    builder: std::result::Result<Arc<ProvenanceBuilder>, String>,
    paused: bool,
}

impl AppState {
    pub fn new(builder: ProvenanceBuilder) -> Self {
        Self {
            builder: Ok(Arc::new(builder)),
            paused: false,
        }
    }

    /// State for a service whose configuration could not be loaded
    ///
    /// Every provenance request fails with a configuration error carrying
    /// `reason`.
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            builder: Err(reason.into()),
            paused: false,
        }
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Query parameters of `/prov`
#[derive(Debug, Default, Deserialize)]
pub struct ProvParams {
    pub dataset_id: Option<String>,
    pub version_id: Option<String>,
    pub rdf_format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvResponse {
    pub format: String,
    pub media_type: String,
    pub prov: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Failure of a provenance request
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Provenance generation is paused")]
    Paused,
    #[error(transparent)]
    Prov(#[from] ProvError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingParameter(_) => "missing_parameter",
            ApiError::Paused => "paused",
            ApiError::Prov(e) => e.kind().as_str(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Paused => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Prov(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Provenance request failed: {}", self);
        } else {
            warn!("Provenance request rejected: {}", self);
        }

        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "kind": self.kind(),
            })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/prov", get(prov_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind `host:port` and serve until the process stops
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server terminated")
}

async fn prov_handler(
    State(state): State<AppState>,
    Query(params): Query<ProvParams>,
) -> std::result::Result<Json<ProvResponse>, ApiError> {
    if state.paused {
        return Err(ApiError::Paused);
    }
    let builder = state
        .builder
        .as_ref()
        .map_err(|reason| ProvError::configuration(reason.clone()))?;

    let dataset_id = required(params.dataset_id.as_deref(), "dataset_id")?;
    let version_id = required(params.version_id.as_deref(), "version_id")?;
    let format = builder.resolve_format(params.rdf_format.as_deref())?;

    let prov = builder
        .generate(dataset_id, version_id, Some(format.name()))
        .await?;
    Ok(Json(ProvResponse {
        format: format.name().to_string(),
        media_type: format.media_type().to_string(),
        prov,
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match (&state.builder, state.paused) {
        (Err(_), _) => "unconfigured",
        (Ok(_), true) => "paused",
        (Ok(_), false) => "ok",
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: oxirs_prov::VERSION.to_string(),
    })
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> std::result::Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::MissingParameter(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use oxirs_prov::loader::{Document, MemoryDocumentLoader};
    use oxirs_prov::resolver::{IdentityResolver, StaticIdentityLookup};
    use oxirs_prov::NamedNode;
    use tower::ServiceExt;

    const SPEC: &str = "demo:\n  title: T\n  description: D\n  pipeline:\n    - run: load\n      parameters:\n        x: 1\n";
    const MANIFEST: &str = r#"{"resources": [{"name": "out.csv", "path": "out.csv", "format": "csv"}]}"#;

    fn state() -> AppState {
        let when = Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap();
        let loader = MemoryDocumentLoader::new()
            .with_document("bucket", "ds/1/data/pipeline-spec.yaml", Document::new(SPEC, when))
            .with_document("bucket", "ds/1/data/datapackage.json", Document::new(MANIFEST, when));
        let resolver = IdentityResolver::new(Arc::new(StaticIdentityLookup::new()));
        let office = NamedNode::new("http://lod.bco-dmo.org/id/affiliation/191").unwrap();
        AppState::new(ProvenanceBuilder::new(Arc::new(loader), resolver, "bucket", office))
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_prov_default_format() {
        let (status, body) = get_json(state(), "/prov?dataset_id=ds&version_id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["format"], "turtle");
        assert_eq!(body["media_type"], "text/turtle");
        let prov = body["prov"].as_str().unwrap();
        assert!(prov.contains("@prefix prov: <http://www.w3.org/ns/prov#>"));
        assert!(prov.contains("a prov:Bundle"));
    }

    #[tokio::test]
    async fn test_prov_named_format() {
        let (status, body) =
            get_json(state(), "/prov?dataset_id=ds&version_id=1&rdf_format=json-ld").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["format"], "json-ld");
        assert_eq!(body["media_type"], "application/ld+json");
        let document: serde_json::Value =
            serde_json::from_str(body["prov"].as_str().unwrap()).unwrap();
        assert!(document["@graph"].is_array());
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let (status, body) = get_json(state(), "/prov?dataset_id=ds").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "missing_parameter");
        assert_eq!(body["error"], "Missing required parameter: version_id");
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let (status, body) =
            get_json(state(), "/prov?dataset_id=ds&version_id=1&rdf_format=foo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "unsupported_format");
    }

    #[tokio::test]
    async fn test_unknown_dataset() {
        let (status, body) = get_json(state(), "/prov?dataset_id=nope&version_id=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "input_not_found");
    }

    #[tokio::test]
    async fn test_paused_and_unconfigured() {
        let (status, body) = get_json(
            state().with_paused(true),
            "/prov?dataset_id=ds&version_id=1",
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "paused");

        let (status, body) = get_json(
            AppState::unconfigured("office_uri is not configured"),
            "/prov?dataset_id=ds&version_id=1",
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "configuration");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(state(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (_, body) = get_json(AppState::unconfigured("no bucket"), "/health").await;
        assert_eq!(body["status"], "unconfigured");
    }
}
