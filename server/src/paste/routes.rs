//! JSON and raw-text API endpoints.
//!
//! GET  /api/get/{key}  latest content of a paste
//! POST /api/upload  create from a JSON body `{"content": "..."}`
//! POST /api/upload/raw  create from the raw request body

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::PasteError;
use crate::paste::run_blocking;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PasteResponse {
    pub content: String,
    /// Number of stored versions, including the one returned
    pub versions: usize,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub key: String,
}

/// GET /api/get/{key}
///
/// 404 when the key was never written, 500 when the latest version cannot be
/// decrypted with the current server key.
pub async fn api_get_paste(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<PasteResponse>, PasteError> {
    let store = state.store.clone();
    let latest = run_blocking(move || store.latest(&key)).await?;

    Ok(Json(PasteResponse {
        content: latest.content,
        versions: latest.versions,
    }))
}

/// POST /api/upload
///
/// Body rejections (wrong content type, malformed JSON, oversized body) are
/// reported in the same JSON shape as an empty upload.
pub async fn api_upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(req)) => upload(state, req.content.unwrap_or_default()).await,
        Err(rejection) => upload_error(rejection.status(), &rejection.body_text()),
    }
}

/// POST /api/upload/raw
///
/// The body is taken as-is; it must be valid UTF-8.
pub async fn api_upload_raw(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return upload_error(rejection.status(), &rejection.body_text()),
    };
    match String::from_utf8(body.to_vec()) {
        Ok(content) => upload(state, content).await,
        Err(_) => upload_error(StatusCode::BAD_REQUEST, "Request body must be valid UTF-8"),
    }
}

async fn upload(state: AppState, content: String) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.create_with_generated_key(&content)).await {
        Ok(key) => {
            tracing::info!("Created paste {} via API", key);
            Json(UploadResponse {
                status: "success".to_string(),
                key,
            })
            .into_response()
        }
        Err(e @ PasteError::EmptyContent) => upload_error(e.status_code(), e.public_message()),
        Err(e) => e.into_response(),
    }
}

fn upload_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "status": "error",
            "message": message,
        })),
    )
        .into_response()
}
