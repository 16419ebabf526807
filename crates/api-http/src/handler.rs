//! HTTP Handlers
//!
//! Upload is synchronous from the client's point of view: the response
//! arrives only after separation and publishing finished. Progress for
//! a running job streams separately over SSE.

use std::convert::Infallible;
use std::path::PathBuf;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, PROCESSING_ERROR_MESSAGE};
use crate::state::AppState;
use crate::types::{HealthResponse, JobsResponse, StemLink, UploadResponse};
use stemflow_core::VERSION;

/// Multipart field name the upload must arrive under
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Route prefix stem artifacts are served from. Locators returned in
/// upload responses are rooted here.
pub const STEMS_ROUTE: &str = "/stems";

/// Upload size cap. Lossless full-length tracks fit comfortably.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Build the application router.
///
/// `public_dir` is the directory published stems are served from under
/// [`STEMS_ROUTE`].
pub fn router(state: AppState, public_dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/jobs", get(list_jobs))
        .route("/jobs/{job_id}/progress", get(job_progress))
        .route("/health", get(health))
        .nest_service(STEMS_ROUTE, ServeDir::new(public_dir.into()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /upload
///
/// Spools the multipart file to disk, runs the full separation job,
/// and responds with the published stem links once everything is done.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut spooled: Option<(PathBuf, String)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            debug!(field = ?field.name(), "Ignoring unexpected multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();

        fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(|e| spool_failure("create upload dir", e))?;
        let spool_path = state.upload_dir.join(format!("upload-{}", Uuid::new_v4()));
        let mut spool = fs::File::create(&spool_path)
            .await
            .map_err(|e| spool_failure("create spool file", e))?;

        // Stream the part to disk chunk by chunk; the upload is never
        // held in memory as a whole
        let mut written: u64 = 0;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = spool.write_all(&chunk).await {
                        drop(spool);
                        discard_spool(&spool_path).await;
                        return Err(spool_failure("write spool file", e));
                    }
                    written += chunk.len() as u64;
                }
                Ok(None) => break,
                Err(e) => {
                    drop(spool);
                    discard_spool(&spool_path).await;
                    return Err(ApiError::BadRequest(e.to_string()));
                }
            }
        }
        if let Err(e) = spool.flush().await {
            drop(spool);
            discard_spool(&spool_path).await;
            return Err(spool_failure("flush spool file", e));
        }
        drop(spool);

        if written == 0 {
            discard_spool(&spool_path).await;
            return Err(ApiError::no_file());
        }

        info!(
            file_name = %file_name,
            bytes = written,
            "Upload received"
        );
        spooled = Some((spool_path, file_name));
        break;
    }

    let (spool_path, file_name) = spooled.ok_or_else(ApiError::no_file)?;

    let completed = match state.supervisor.run_job(&spool_path, &file_name).await {
        Ok(completed) => completed,
        Err(e) => {
            // On success the spool was moved into the workspace; on
            // any failure path it may still be sitting in the upload
            // dir and must not accumulate there
            discard_spool(&spool_path).await;
            return Err(e.into());
        }
    };

    let stems = completed
        .references
        .into_iter()
        .map(|r| StemLink {
            name: r.stem.to_string(),
            url: r.locator,
        })
        .collect();

    Ok(Json(UploadResponse {
        success: true,
        message: "Processing complete".to_string(),
        stems,
    }))
}

fn spool_failure(stage: &str, e: std::io::Error) -> ApiError {
    warn!(stage = %stage, error = %e, "Upload spooling failed");
    ApiError::Internal(PROCESSING_ERROR_MESSAGE.to_string())
}

/// Best-effort removal of a spool file that did not make it into a
/// workspace. Already-gone is fine.
async fn discard_spool(path: &std::path::Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(spool = %path.display(), error = %e, "Failed to remove spool file");
        }
    }
}

/// GET /jobs - every job with observable progress state
async fn list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(JobsResponse {
        jobs: state.registry.active(),
    })
}

/// GET /jobs/{job_id}/progress
///
/// SSE stream of progress snapshots: the latest snapshot immediately,
/// then one event per change. The stream ends when the job's channel
/// is dropped (failure, or reaping after the retention window).
async fn job_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let channel = state
        .registry
        .get(&job_id)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {job_id}")))?;

    let (initial, mut rx) = channel.subscribe();
    // Only the receiver moves into the stream; holding the channel here
    // would keep the sender alive past deregistration and the stream
    // would never end
    drop(channel);

    let stream = async_stream::stream! {
        if let Ok(event) = Event::default().json_data(initial) {
            yield Ok(event);
        }
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    if let Ok(event) = Event::default().json_data(snapshot) {
                        yield Ok(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Skipped snapshots are stale anyway; the next
                    // received one carries the current state
                    warn!(job_id = %job_id, skipped, "Progress subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use stemflow_core::application::{JobRegistry, JobSupervisor};
    use stemflow_core::port::id_provider::SequentialIdProvider;
    use stemflow_core::port::separator::mocks::MockSeparator;
    use stemflow_core::port::stem_publisher::mocks::MockStemPublisher;
    use stemflow_core::port::time_provider::SystemTimeProvider;
    use stemflow_core::port::workspace_store::mocks::MockWorkspaceStore;
    use stemflow_core::port::{Separator, StemPublisher, WorkspaceStore};

    const BOUNDARY: &str = "stemflow-test-boundary";

    fn test_state_with(
        separator: MockSeparator,
        workspaces: MockWorkspaceStore,
        publisher: MockStemPublisher,
    ) -> AppState {
        let registry = Arc::new(JobRegistry::new());
        let supervisor = Arc::new(JobSupervisor::new(
            Arc::new(separator) as Arc<dyn Separator>,
            Arc::new(workspaces) as Arc<dyn WorkspaceStore>,
            Arc::new(publisher) as Arc<dyn StemPublisher>,
            Arc::clone(&registry),
            Arc::new(SystemTimeProvider),
            Arc::new(SequentialIdProvider::new()),
            Duration::from_secs(3600),
        ));
        // Fresh spool dir per state so tests can assert its contents
        let upload_dir =
            std::env::temp_dir().join(format!("stemflow-api-test-{}", uuid::Uuid::new_v4()));
        AppState::new(supervisor, registry, upload_dir)
    }

    fn test_state(separator: MockSeparator, publisher: MockStemPublisher) -> AppState {
        test_state_with(separator, MockWorkspaceStore::new(), publisher)
    }

    fn test_router(state: AppState) -> Router {
        router(state, std::env::temp_dir())
    }

    fn multipart_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_router(test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        ));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_returns_published_stems() {
        let app = test_router(test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        ));

        let response = app
            .oneshot(multipart_request("file", "song.wav", b"fake audio"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Processing complete");
        assert_eq!(body["stems"].as_array().unwrap().len(), 4);
        for stem in body["stems"].as_array().unwrap() {
            assert!(stem["url"].as_str().unwrap().starts_with("/stems/"));
        }
    }

    #[tokio::test]
    async fn test_upload_without_file_field_is_rejected() {
        let app = test_router(test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        ));

        let response = app
            .oneshot(multipart_request("not-a-file", "song.wav", b"x"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No file uploaded.");
    }

    #[tokio::test]
    async fn test_upload_with_empty_file_is_rejected() {
        let app = test_router(test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        ));

        let response = app
            .oneshot(multipart_request("file", "song.wav", b""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_failed_separation_maps_to_fixed_error_body() {
        let app = test_router(test_state(
            MockSeparator::new_exit(1),
            MockStemPublisher::new_all_stems(),
        ));

        let response = app
            .oneshot(multipart_request("file", "song.wav", b"fake audio"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error processing audio file.");
    }

    fn spool_files(state: &AppState) -> Vec<std::path::PathBuf> {
        match std::fs::read_dir(&state.upload_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_workspace_setup_failure_does_not_leak_spool() {
        let state = test_state_with(
            MockSeparator::new_success(),
            MockWorkspaceStore::new_failing(),
            MockStemPublisher::new_all_stems(),
        );
        let app = test_router(state.clone());

        let response = app
            .oneshot(multipart_request("file", "song.wav", b"fake audio"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let leftovers = spool_files(&state);
        assert!(leftovers.is_empty(), "spool files left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_failed_job_does_not_leak_spool() {
        let state = test_state_with(
            MockSeparator::new_exit(1),
            MockWorkspaceStore::new(),
            MockStemPublisher::new_all_stems(),
        );
        let app = test_router(state.clone());

        let response = app
            .oneshot(multipart_request("file", "song.wav", b"fake audio"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let leftovers = spool_files(&state);
        assert!(leftovers.is_empty(), "spool files left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_jobs_lists_completed_job_until_reaped() {
        let state = test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        );
        let app = test_router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart_request("file", "song.wav", b"fake audio"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let jobs = body["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["progress"]["vocals"], 1.0);
    }

    #[tokio::test]
    async fn test_progress_for_unknown_job_is_not_found() {
        let app = test_router(test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        ));

        let response = app
            .oneshot(
                Request::get("/jobs/no-such-job/progress")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_progress_stream_is_event_stream() {
        let state = test_state(
            MockSeparator::new_success(),
            MockStemPublisher::new_all_stems(),
        );
        let app = test_router(state.clone());

        // Run one job to register a channel, then attach to it
        let response = app
            .clone()
            .oneshot(multipart_request("file", "song.wav", b"fake audio"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job_id = state.registry.active()[0].job_id.clone();

        let response = app
            .oneshot(
                Request::get(format!("/jobs/{job_id}/progress"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("text/event-stream"));
    }
}
