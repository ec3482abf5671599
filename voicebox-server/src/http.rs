// HTTP server with the text-to-speech API and the cached audio route

use crate::config::NetworkConfig;
use crate::static_files::serve_artifact;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, error, warn};
use voicebox_spk::{SpeechError, SpeechService};

pub const HEALTH_PATH: &str = "/health";

// API state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SpeechService>,
}

impl AppState {
    pub fn new(service: SpeechService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Fields accepted by the text-to-speech endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeechResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_url: Option<String>,
}

impl SpeechResponse {
    pub fn success(voice_url: String, message: Option<&str>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.map(str::to_string),
            voice_url: Some(voice_url),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.to_string()),
            voice_url: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create HTTP router with all routes
pub fn create_router(state: AppState, network: &NetworkConfig) -> Router {
    let files_route = format!(
        "{}/:file",
        state.service.config().url_prefix.trim_end_matches('/')
    );

    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(&network.api_path, post(text_to_speech_handler))
        .route(&files_route, get(serve_artifact))
        .layer(DefaultBodyLimit::max(network.max_request_size))
        .layer(cors_layer(&network.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim_end_matches('/')) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(values))
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Text-to-speech endpoint
///
/// Client mistakes are reported in the JSON body with a 200 status; only
/// provider and filesystem failures produce a 500.
async fn text_to_speech_handler(State(state): State<AppState>, request: Request) -> Response {
    let text = match extract_text(&state, request).await {
        Ok(text) => text.unwrap_or_default(),
        Err(response) => return response,
    };

    match state.service.speak(&text).await {
        Ok(artifact) => {
            let message = (!artifact.cached).then_some("Audio content generated successfully.");
            Json(SpeechResponse::success(artifact.url, message)).into_response()
        }
        Err(e) if e.is_client_error() => Json(SpeechResponse::error(client_message(&e))).into_response(),
        Err(e) => {
            error!("Speech synthesis failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SpeechResponse::error("Speech synthesis failed.")),
            )
                .into_response()
        }
    }
}

fn client_message(err: &SpeechError) -> &'static str {
    match err {
        SpeechError::TextTooLong { .. } => "Text is too long.",
        _ => "Text is required.",
    }
}

/// Pull `text` from the body (form, multipart or JSON), falling back to the query string.
async fn extract_text(state: &AppState, request: Request) -> Result<Option<String>, Response> {
    let query_text = request
        .uri()
        .query()
        .and_then(|q| form_field(q.as_bytes(), "text"));

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let body_text = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let mut found = None;
        loop {
            match multipart.next_field().await {
                Ok(Some(field)) if field.name() == Some("text") => {
                    found = Some(field.text().await.map_err(IntoResponse::into_response)?);
                    break;
                }
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => return Err(e.into_response()),
            }
        }
        found
    } else {
        let body = Bytes::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if content_type.starts_with("application/json") {
            match serde_json::from_slice::<SpeechRequest>(&body) {
                Ok(parsed) => parsed.text,
                Err(e) => {
                    debug!("Rejected JSON body: {}", e);
                    return Err(Json(SpeechResponse::error("Invalid request body.")).into_response());
                }
            }
        } else {
            form_field(&body, "text")
        }
    };

    Ok(body_text.or(query_text))
}

fn form_field(encoded: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
