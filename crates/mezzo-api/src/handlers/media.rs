//! Media item handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mezzo_models::{CreatorId, JobId, MediaId, MediaItem, MediaType};
use mezzo_store::{MediaStore, StoreError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body for registering a confirmed upload.
#[derive(Debug, Deserialize)]
pub struct RegisterMediaRequest {
    pub creator_id: String,
    pub media_type: MediaType,
    /// Storage key of the raw upload
    pub original_key: String,
    /// Optional caller-chosen ID; generated when absent
    #[serde(default)]
    pub media_id: Option<String>,
}

/// Response for a dispatched transcoding job.
///
/// Deliberately not the full job record: the callback secret never
/// leaves the server.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub job_id: JobId,
    pub media_id: MediaId,
    pub attempt: u32,
    pub dispatched_at: DateTime<Utc>,
}

/// POST /api/media — register an upload-confirmed media item.
pub async fn register_media(
    State(state): State<AppState>,
    Json(request): Json<RegisterMediaRequest>,
) -> ApiResult<(StatusCode, Json<MediaItem>)> {
    if request.original_key.is_empty() {
        return Err(ApiError::bad_request("original_key must not be empty"));
    }

    let id = request
        .media_id
        .map(MediaId::from_string)
        .unwrap_or_default();
    let item = MediaItem::new(
        id,
        CreatorId::from_string(request.creator_id),
        request.media_type,
        request.original_key,
    );

    match state.store.insert_media(item.clone()).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(item))),
        Err(StoreError::AlreadyExists(key)) => {
            Err(ApiError::Conflict(format!("Media item {} already exists", key)))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/media/:media_id — fetch a media item.
pub async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> ApiResult<Json<MediaItem>> {
    let id = MediaId::from_string(media_id);
    let item = state
        .store
        .get_media(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Media item {}", id)))?;
    Ok(Json(item))
}

/// POST /api/media/:media_id/transcode — dispatch a transcoding job.
pub async fn start_transcode(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> ApiResult<(StatusCode, Json<DispatchResponse>)> {
    let id = MediaId::from_string(media_id);
    let job = state.dispatcher.dispatch(&id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DispatchResponse {
            job_id: job.job_id,
            media_id: job.media_id,
            attempt: job.attempt,
            dispatched_at: job.dispatched_at,
        }),
    ))
}
