//! HTTP API for browser clients
//!
//! Endpoints:
//!   POST /api/upload          - `{"image": <base64>, "timestamp": ...}` → encrypt + store
//!   GET  /api/status          - `{"status": "running"}`
//!   GET  /api/images          - stored artifact ids, oldest first
//!   GET  /api/decrypt/{id}    - decrypted image bytes (image/jpeg)
//!   GET  /api/public-key      - server public key (SPKI PEM)

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use camvault_core::types::UploadMeta;
use camvault_core::VaultError;

use crate::metrics::VaultMetrics;
use crate::vault::Vault;

#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
    pub metrics: VaultMetrics,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/status", get(status))
        .route("/api/images", get(list_images))
        .route("/api/decrypt/{id}", get(decrypt_image))
        .route("/api/public-key", get(public_key))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

// ── Request/Response types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Base64 image bytes, optionally as a `data:` URL
    pub image: Option<String>,
    /// Client capture time; any JSON value, stored as text
    #[serde(default)]
    pub timestamp: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub images: Vec<String>,
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Body was not acceptable JSON (content type, syntax, field types, size)
    #[error("{}", .0.body_text())]
    Payload(#[from] JsonRejection),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Payload(rejection) => match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Vault(e) => match e {
                VaultError::InvalidId(_) => StatusCode::BAD_REQUEST,
                VaultError::NotFound(_) => StatusCode::NOT_FOUND,
                VaultError::Framing(_) | VaultError::Decryption { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Payload(_) => "bad_payload",
            ApiError::Vault(e) => e.kind(),
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), "request failed: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Run vault work on the blocking pool.
async fn blocking<T, F>(vault: &Arc<Vault>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Vault) -> Result<T, VaultError> + Send + 'static,
{
    let vault = vault.clone();
    tokio::task::spawn_blocking(move || f(&vault))
        .await
        .map_err(|e| ApiError::Internal(format!("task join: {e}")))?
        .map_err(ApiError::from)
}

// ── Handlers ────────────────────────────────────────────────────────────────

async fn upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let result = match payload {
        Ok(Json(req)) => upload_inner(&state, req).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    if let Err(e) = &result {
        state.metrics.failure("upload", e.kind());
    }
    result
}

async fn upload_inner(state: &AppState, req: UploadRequest) -> Result<Json<UploadResponse>, ApiError> {
    // An empty image is accepted and stored as an empty blob
    let image = req
        .image
        .ok_or_else(|| ApiError::BadRequest("No image data provided".into()))?;
    let bytes = decode_image(&image)?;

    let upload = UploadMeta {
        original_timestamp: timestamp_text(&req.timestamp),
    };
    let size = bytes.len();
    let started = Instant::now();
    let id = blocking(&state.vault, move |vault| vault.seal(&bytes, &upload)).await?;
    state.metrics.upload_ok(started.elapsed());

    info!(id = %id, bytes = size, "upload encrypted");
    Ok(Json(UploadResponse {
        success: true,
        filename: id.to_string(),
    }))
}

async fn status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "running" }))
}

async fn list_images(State(state): State<AppState>) -> Result<Json<ImagesResponse>, ApiError> {
    let ids = blocking(&state.vault, |vault| vault.list()).await?;
    Ok(Json(ImagesResponse {
        images: ids.into_iter().map(|id| id.to_string()).collect(),
    }))
}

async fn decrypt_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let result = blocking(&state.vault, move |vault| vault.open(&id)).await;
    match result {
        Ok(image) => {
            state.metrics.decrypt_ok(started.elapsed());
            Ok(([(header::CONTENT_TYPE, "image/jpeg")], image).into_response())
        }
        Err(e) => {
            if !matches!(e.status(), StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
                warn!(kind = e.kind(), "decrypt failed: {e}");
            }
            state.metrics.failure("decrypt", e.kind());
            Err(e)
        }
    }
}

async fn public_key(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/x-pem-file")],
        state.vault.public_key_pem().to_vec(),
    )
        .into_response()
}

/// Accept raw base64 or a `data:image/...;base64,` URL.
fn decode_image(image: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match image.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ApiError::BadRequest("malformed data URL".into()))?,
        None => image,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 image: {e}")))
}

fn timestamp_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
