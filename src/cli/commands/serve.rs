//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for uploading videos, watching indexing jobs,
//! and asking questions about the indexed content.

use crate::cli::commands::ask::build_engine;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::BlikkError;
use crate::indexer::Indexer;
use crate::jobs::{JobQueue, JobStatus};
use crate::synthesis::AnswerEngine;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    queue: JobQueue,
    engine: AnswerEngine,
    uploads_dir: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let indexer = Arc::new(Indexer::new(&settings)?);
    let engine = build_engine(&indexer, &settings);
    let queue = JobQueue::start(indexer);

    let uploads_dir = settings.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)?;

    let state = Arc::new(AppState {
        queue,
        engine,
        uploads_dir,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/jobs/{id}", get(job_status).delete(cancel_job))
        .route("/chat", post(chat))
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Blikk API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Upload", "POST   /upload");
    Output::kv("Job Status", "GET    /jobs/:id");
    Output::kv("Cancel Job", "DELETE /jobs/:id");
    Output::kv("Chat", "POST   /chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize)]
struct UploadResponse {
    job_id: Uuid,
    filename: String,
    message: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    text: String,
    start: f64,
    end: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Accept a multipart video upload, persist it, and queue an indexing job.
///
/// Returns immediately; indexing happens in the background worker.
async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        // Keep only the final path component of whatever the client sent.
        let filename = std::path::Path::new(&original_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.mp4".to_string());

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read upload: {}", e),
                )
            }
        };

        // Prefix with a uuid so repeated uploads never clobber each other.
        let stored_name = format!("{}_{}", Uuid::new_v4(), filename);
        let dest = state.uploads_dir.join(&stored_name);
        if let Err(e) = tokio::fs::write(&dest, &bytes).await {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store upload: {}", e),
            );
        }

        return match state.queue.submit(dest).await {
            Ok(job_id) => Json(UploadResponse {
                job_id,
                filename,
                message: "Upload accepted; indexing queued.".to_string(),
            })
            .into_response(),
            Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
    }

    error_response(
        StatusCode::BAD_REQUEST,
        "Multipart request must include a file field",
    )
}

async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatus>, axum::response::Response> {
    state.queue.status(id).map(Json).ok_or_else(|| {
        error_response(StatusCode::NOT_FOUND, format!("Unknown job: {}", id))
    })
}

async fn cancel_job(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> impl IntoResponse {
    if state.queue.cancel(id) {
        Json(serde_json::json!({ "cancelled": true })).into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("Unknown job: {}", id))
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    // A body without a "query" field is a schema violation, not a server error.
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.engine.ask(&req.query).await {
        Ok(answer) => Json(ChatResponse {
            answer: answer.answer,
            sources: answer
                .sources
                .into_iter()
                .map(|s| SourceInfo {
                    text: s.text,
                    start: s.start,
                    end: s.end,
                })
                .collect(),
        })
        .into_response(),
        Err(BlikkError::InvalidInput(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
