//! Router-level tests with a mocked worker service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mezzo_api::{create_router, ApiConfig, AppState};
use mezzo_models::{
    CompletionPayload, JobId, MediaStatus, TranscodeOutput, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use mezzo_pipeline::PipelineConfig;
use mezzo_store::{JobStore, MemoryStore};
use mezzo_worker::{sign_body, HttpWorkerClient, WorkerConfig};

struct TestApp {
    router: Router,
    state: AppState,
    _worker: MockServer,
}

async fn spawn_app() -> TestApp {
    let worker = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "rp-1" })),
        )
        .mount(&worker)
        .await;

    let client = HttpWorkerClient::new(WorkerConfig {
        base_url: worker.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let state = AppState::from_parts(
        ApiConfig::default(),
        PipelineConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(client),
    );
    let router = create_router(state.clone(), None);

    TestApp {
        router,
        state,
        _worker: worker,
    }
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &TestApp, media_id: &str) {
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            serde_json::json!({
                "creator_id": "creator-1",
                "media_type": "video",
                "original_key": "creator-1/originals/raw.mp4",
                "media_id": media_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

fn video_output() -> TranscodeOutput {
    TranscodeOutput {
        stream_manifest_key: "creator-1/hls/m1/master.m3u8".to_string(),
        preview_manifest_key: None,
        thumbnail_key: Some("creator-1/thumbnails/m1/640.webp".to_string()),
        waveform_key: None,
        waveform_image_key: None,
        mezzanine_key: None,
        duration_seconds: 120,
        width: Some(1920),
        height: Some(1080),
        ready_variants: vec!["1080p".into(), "720p".into()],
        loudness: None,
    }
}

#[tokio::test]
async fn test_register_and_fetch_media() {
    let app = spawn_app().await;
    register(&app, "m1").await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/media/m1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "uploaded");
    assert_eq!(body["creator_id"], "creator-1");

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/media/nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app().await;
    register(&app, "m1").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            serde_json::json!({
                "creator_id": "creator-1",
                "media_type": "video",
                "original_key": "creator-1/originals/raw.mp4",
                "media_id": "m1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_transcode_dispatch_and_conflict() {
    let app = spawn_app().await;
    register(&app, "m1").await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/api/media/m1/transcode"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["job_id"], "rp-1");
    assert_eq!(body["attempt"], 1);
    assert!(body.get("callback_secret").is_none());

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/media/m1"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "transcoding");

    // Already transcoding
    let response = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/api/media/m1/transcode"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_webhook_applies_signed_callback() {
    let app = spawn_app().await;
    register(&app, "m1").await;
    app.router
        .clone()
        .oneshot(empty_request("POST", "/api/media/m1/transcode"))
        .await
        .unwrap();

    let job_id = JobId::from("rp-1");
    let job = app.state.store.get_job(&job_id).await.unwrap().unwrap();
    let payload = CompletionPayload::completed(job_id, video_output());
    let body = serde_json::to_vec(&payload).unwrap();
    let signature = sign_body(&job.callback_secret, &body);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/transcoding")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, &signature)
        .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
        .body(Body::from(body.clone()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["outcome"], "applied");
    assert_eq!(parsed["status"], "ready");

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/media/m1"))
        .await
        .unwrap();
    let media = body_json(response).await;
    assert_eq!(media["status"], "ready");
    assert_eq!(media["duration_seconds"], 120);

    // Redelivery acknowledges without reapplying
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/transcoding")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, &signature)
        .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["outcome"], "duplicate");
}

#[tokio::test]
async fn test_webhook_rejects_bad_or_missing_signature() {
    let app = spawn_app().await;
    register(&app, "m1").await;
    app.router
        .clone()
        .oneshot(empty_request("POST", "/api/media/m1/transcode"))
        .await
        .unwrap();

    let payload = CompletionPayload::completed(JobId::from("rp-1"), video_output());
    let body = serde_json::to_vec(&payload).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/transcoding")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, "00".repeat(32))
        .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
        .body(Body::from(body.clone()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/transcoding")
        .header("content-type", "application/json")
        .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Rejections leave the item where it was
    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/media/m1"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "transcoding");
}

#[tokio::test]
async fn test_webhook_rejects_stale_timestamp() {
    let app = spawn_app().await;
    register(&app, "m1").await;
    app.router
        .clone()
        .oneshot(empty_request("POST", "/api/media/m1/transcode"))
        .await
        .unwrap();

    let job_id = JobId::from("rp-1");
    let job = app.state.store.get_job(&job_id).await.unwrap().unwrap();
    let payload = CompletionPayload::completed(job_id, video_output());
    let body = serde_json::to_vec(&payload).unwrap();
    let signature = sign_body(&job.callback_secret, &body);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/transcoding")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .header(TIMESTAMP_HEADER, (Utc::now().timestamp() - 3600).to_string())
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_probes() {
    let app = spawn_app().await;

    for uri in ["/health", "/healthz", "/ready"] {
        let response = app
            .router
            .clone()
            .oneshot(empty_request("GET", uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_failed_media_status_is_visible() {
    let app = spawn_app().await;
    register(&app, "m1").await;
    app.router
        .clone()
        .oneshot(empty_request("POST", "/api/media/m1/transcode"))
        .await
        .unwrap();

    let job_id = JobId::from("rp-1");
    let job = app.state.store.get_job(&job_id).await.unwrap().unwrap();
    let payload = CompletionPayload::failed(job_id, "loudnorm analysis failed");
    let body = serde_json::to_vec(&payload).unwrap();
    let signature = sign_body(&job.callback_secret, &body);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/transcoding")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .header(TIMESTAMP_HEADER, Utc::now().timestamp().to_string())
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "failed");

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/media/m1"))
        .await
        .unwrap();
    let media = body_json(response).await;
    assert_eq!(media["status"], MediaStatus::Failed.as_str());
    assert_eq!(media["last_error"], "loudnorm analysis failed");
}
