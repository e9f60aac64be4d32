//! Analysis through a trusted intermediary that holds the credential.
//!
//! Wire contract: `POST {base64Image, prompt}` → `200 {text}` or
//! `4xx/5xx {error}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

use super::request::AnalysisRequest;
use super::strategy::{AnalysisError, AnalysisStrategy};

/// JSON body sent to the intermediary.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub base64_image: String,
    pub prompt: String,
}

/// JSON body returned by the intermediary.  Exactly one field is expected,
/// but both are optional so a malformed body degrades to `EmptyResult`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProxyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ProxiedStrategy {
    client: reqwest::Client,
    url: String,
}

impl ProxiedStrategy {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_timeout(
            config.proxy_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl AnalysisStrategy for ProxiedStrategy {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let body = ProxyRequest {
            base64_image: request.base64_image.clone(),
            prompt: request.prompt.clone(),
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();

        if status.is_server_error() {
            log::warn!("analysis: intermediary returned {status}");
            return Err(AnalysisError::ServiceUnavailable(status.as_u16()));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            log::warn!("analysis: intermediary refused the request ({status})");
            return Err(AnalysisError::NotAuthorized);
        }

        let parsed: ProxyResponse = response.json().await.unwrap_or_default();

        if !status.is_success() {
            let detail = parsed
                .error
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            log::warn!("analysis: intermediary rejected the request: {detail}");
            return Err(AnalysisError::Failed(detail));
        }

        match parsed.text.map(|t| t.trim().to_string()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(AnalysisError::EmptyResult),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::EncodedFrame;
    use crate::locale;
    use crate::task::Task;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn stub_router() -> Router {
        Router::new()
            .route(
                "/ok",
                post(|Json(body): Json<ProxyRequest>| async move {
                    Json(ProxyResponse {
                        text: Some(format!("seen {} bytes", body.base64_image.len())),
                        error: None,
                    })
                }),
            )
            .route(
                "/down",
                post(|| async {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(ProxyResponse {
                            text: None,
                            error: Some("upstream down".into()),
                        }),
                    )
                }),
            )
            .route("/forbidden", post(|| async { StatusCode::FORBIDDEN }))
            .route(
                "/rejected",
                post(|| async {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(ProxyResponse {
                            text: None,
                            error: Some("image too large".into()),
                        }),
                    )
                }),
            )
            .route("/empty", post(|| async { "not json" }))
            .route(
                "/slow",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    Json(ProxyResponse::default())
                }),
            )
    }

    fn request() -> AnalysisRequest {
        let frame = EncodedFrame {
            mime_type: "image/jpeg".into(),
            base64: "AAAA".into(),
        };
        AnalysisRequest::new(Task::CrossRoad, frame, locale::default_locale(), None, None)
    }

    async fn call(base: &str, path: &str) -> Result<String, AnalysisError> {
        ProxiedStrategy::with_timeout(format!("{base}{path}"), Duration::from_secs(1))
            .analyze(&request())
            .await
    }

    #[tokio::test]
    async fn success_returns_text() {
        let base = serve(stub_router()).await;
        assert_eq!(call(&base, "/ok").await.unwrap(), "seen 4 bytes");
    }

    #[tokio::test]
    async fn server_error_maps_to_service_unavailable() {
        let base = serve(stub_router()).await;
        assert_eq!(
            call(&base, "/down").await,
            Err(AnalysisError::ServiceUnavailable(503))
        );
    }

    #[tokio::test]
    async fn forbidden_maps_to_not_authorized() {
        let base = serve(stub_router()).await;
        assert_eq!(call(&base, "/forbidden").await, Err(AnalysisError::NotAuthorized));
    }

    #[tokio::test]
    async fn other_client_error_carries_detail() {
        let base = serve(stub_router()).await;
        assert_eq!(
            call(&base, "/rejected").await,
            Err(AnalysisError::Failed("image too large".into()))
        );
    }

    #[tokio::test]
    async fn malformed_body_is_empty_result() {
        let base = serve(stub_router()).await;
        assert_eq!(call(&base, "/empty").await, Err(AnalysisError::EmptyResult));
    }

    #[tokio::test]
    async fn slow_intermediary_times_out() {
        let base = serve(stub_router()).await;
        assert_eq!(call(&base, "/slow").await, Err(AnalysisError::TimedOut));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_connection_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = call(&format!("http://{addr}"), "/ok").await.unwrap_err();
        assert!(matches!(err, AnalysisError::ConnectionFailed(_)), "got {err:?}");
    }
}
