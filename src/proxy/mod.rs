//! The trusted intermediary used by the proxied analysis strategy.
//!
//! Holds the model credential server-side and relays
//! `POST /api/analyze {base64Image, prompt}` to the model service, answering
//! `{text}` or `{error}` with a status the client maps back to an
//! [`AnalysisError`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine as _;

use crate::analysis::{AnalysisError, DirectStrategy, ProxyRequest, ProxyResponse};
use crate::camera::sniff_mime;

pub const ANALYZE_PATH: &str = "/api/analyze";

/// The model call the intermediary performs on behalf of clients.
#[async_trait]
pub trait VisionUpstream: Send + Sync {
    async fn generate(
        &self,
        mime_type: &str,
        base64_image: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError>;
}

#[async_trait]
impl VisionUpstream for DirectStrategy {
    async fn generate(
        &self,
        mime_type: &str,
        base64_image: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        DirectStrategy::generate(self, mime_type, base64_image, prompt).await
    }
}

#[derive(Clone)]
pub struct ProxyState {
    upstream: Arc<dyn VisionUpstream>,
}

impl ProxyState {
    pub fn new(upstream: Arc<dyn VisionUpstream>) -> Self {
        Self { upstream }
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(ANALYZE_PATH, post(analyze))
        .with_state(state)
}

type Reply = (StatusCode, Json<ProxyResponse>);

async fn analyze(
    State(state): State<ProxyState>,
    body: Result<Json<ProxyRequest>, JsonRejection>,
) -> Reply {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            log::warn!("proxy: bad request body: {rejection}");
            return failure(StatusCode::BAD_REQUEST, "request body must be {base64Image, prompt}");
        }
    };

    if request.prompt.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "prompt is empty");
    }
    let mime_type = match base64::engine::general_purpose::STANDARD.decode(&request.base64_image) {
        Ok(bytes) => match sniff_mime(&bytes) {
            Some(mime) => mime,
            None => return failure(StatusCode::BAD_REQUEST, "image must be JPEG or PNG"),
        },
        Err(_) => return failure(StatusCode::BAD_REQUEST, "base64Image is not valid base64"),
    };

    match state
        .upstream
        .generate(mime_type, &request.base64_image, &request.prompt)
        .await
    {
        Ok(text) => (
            StatusCode::OK,
            Json(ProxyResponse {
                text: Some(text),
                error: None,
            }),
        ),
        Err(e) => {
            log::warn!("proxy: upstream failed: {e}");
            failure(status_for(&e), &e.to_string())
        }
    }
}

/// HTTP status reported to clients for an upstream failure.
///
/// An empty model answer is still a `200`: the body carries no `text`, which
/// the client reads as an empty result rather than an outage.
pub fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::InvalidCredential | AnalysisError::NotAuthorized => StatusCode::FORBIDDEN,
        AnalysisError::ServiceUnavailable(_)
        | AnalysisError::ConnectionFailed(_)
        | AnalysisError::TimedOut => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::EmptyResult => StatusCode::OK,
        AnalysisError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(status: StatusCode, message: &str) -> Reply {
    (
        status,
        Json(ProxyResponse {
            text: None,
            error: Some(message.to_string()),
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
