//! Worker completion-callback handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use mezzo_models::{MediaStatus, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use mezzo_pipeline::CallbackOutcome;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MediaStatus>,
}

/// POST /webhooks/transcoding — apply a worker completion callback.
///
/// The raw body bytes go to the receiver untouched; the signature is
/// computed over exactly what was sent, so any re-serialization here
/// would break verification.
pub async fn receive_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CallbackResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing signature header"))?;

    let timestamp: i64 = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ApiError::bad_request("Missing or invalid timestamp header"))?;

    let outcome = state
        .receiver
        .receive_completion(&body, signature, timestamp)
        .await?;

    let response = match outcome {
        CallbackOutcome::Applied(status) => CallbackResponse {
            outcome: "applied",
            status: Some(status),
        },
        CallbackOutcome::Duplicate => CallbackResponse {
            outcome: "duplicate",
            status: None,
        },
    };
    Ok(Json(response))
}
