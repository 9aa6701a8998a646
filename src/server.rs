/*!
 * HTTP surface.
 *
 * - `POST /upload/`: multipart `file` (optional) and `question`; runs the pipeline
 * - `GET /download/{filename}`: streams a finished video from the output directory
 */

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, Query, State},
    extract::multipart::MultipartRejection,
    extract::rejection::QueryRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};

use crate::extract::Document;
use crate::file_utils::FileManager;
use crate::pipeline::PresentationPipeline;

/// Body of every upload and download error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub message: String,
    pub video_path: Option<String>,
}

impl UploadResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            video_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UploadQuery {
    question: Option<String>,
}

/// Shared handler state
#[derive(Clone)]
pub struct ServerState {
    pipeline: Arc<PresentationPipeline>,
    output_dir: PathBuf,
}

impl ServerState {
    pub fn new(pipeline: Arc<PresentationPipeline>) -> Self {
        let output_dir = pipeline.storage().output_dir.clone();
        Self {
            pipeline,
            output_dir,
        }
    }
}

/// Build the application router
pub fn create_router(state: ServerState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload/", post(upload))
        .route("/upload", post(upload))
        .route("/download/{filename}", get(download))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Bind `address` and serve until Ctrl-C
pub async fn serve(router: Router, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")
}

fn internal_error(message: String) -> (StatusCode, Json<UploadResponse>) {
    error!("{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(UploadResponse::failure(message)),
    )
}

async fn upload(
    State(state): State<ServerState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<UploadResponse>) {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return internal_error(format!("Invalid query: {}", e.body_text())),
    };
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => return internal_error(format!("Invalid upload: {}", e.body_text())),
    };

    let mut document = None;
    let mut question = query.question.unwrap_or_default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return internal_error(format!("Invalid upload: {}", e.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return internal_error(format!("Failed to read upload: {}", e.body_text()));
                    }
                };
                // Browsers send an empty, unnamed part when no file was picked
                if !(file_name.is_empty() && bytes.is_empty()) {
                    document = Some(Document::new(file_name, bytes));
                }
            }
            "question" => match field.text().await {
                Ok(text) => question = text,
                Err(e) => {
                    return internal_error(format!("Failed to read question: {}", e.body_text()));
                }
            },
            _ => {}
        }
    }

    info!(
        "Upload received: document={:?}, question={:?}",
        document.as_ref().map(|d| d.file_name.as_str()),
        question
    );

    let run = state.pipeline.run(document, &question).await;
    (
        StatusCode::OK,
        Json(UploadResponse {
            message: run.message(),
            video_path: run.video_file_name(),
        }),
    )
}

async fn download(State(state): State<ServerState>, UrlPath(filename): UrlPath<String>) -> Response {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(UploadResponse::failure("File not found")),
        )
            .into_response()
    };

    let Some(path) = FileManager::resolve_in_dir(&state.output_dir, &filename) else {
        return not_found();
    };

    match tokio::fs::File::open(&path).await {
        Ok(file) => (
            [
                (header::CONTENT_TYPE, content_type(&filename).to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read {:?}: {}", path, e);
            not_found()
        }
    }
}

fn content_type(filename: &str) -> &'static str {
    match FileManager::extension_of(filename).as_str() {
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "html" => "text/html; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
