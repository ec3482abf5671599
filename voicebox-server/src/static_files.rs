// Serves cached audio artifacts from the cache directory

use crate::http::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use std::io::ErrorKind;
use tracing::{error, warn};

pub async fn serve_artifact(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> impl IntoResponse {
    let cache = state.service.cache();

    // Only names the cache itself produces; this also rules out traversal
    if !cache.is_artifact_name(&file_name) {
        warn!("Rejected artifact request for '{}'", file_name);
        return plain(StatusCode::BAD_REQUEST, "Invalid path");
    }

    let path = cache.dir().join(&file_name);
    match tokio::fs::read(&path).await {
        Ok(audio) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, state.service.config().encoding.content_type())
            .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
            .body(Body::from(audio))
            .unwrap_or_else(|_| internal_error()),
        Err(e) if e.kind() == ErrorKind::NotFound => plain(StatusCode::NOT_FOUND, "Not found"),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            internal_error()
        }
    }
}

fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(message))
        .unwrap_or_else(|_| internal_error())
}

fn internal_error() -> Response<Body> {
    let mut response = Response::new(Body::from("Internal server error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
