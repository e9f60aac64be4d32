//! Direct model call with a client-held credential (local / dev context).
//!
//! Speaks the Gemini `generateContent` REST format: one user turn carrying
//! the inline image and the composed prompt.  The thinking budget is pinned
//! to zero so the model answers with minimum latency.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

use super::request::AnalysisRequest;
use super::strategy::{AnalysisError, AnalysisStrategy};

/// Calls the model service directly with `x-goog-api-key` authentication.
///
/// All connection details come from [`AnalysisConfig`]; the key itself is
/// resolved by [`AnalysisConfig::credential`] and passed in explicitly.
pub struct DirectStrategy {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    thinking_budget: i32,
}

impl DirectStrategy {
    pub fn new(config: &AnalysisConfig, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.model_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            thinking_budget: config.thinking_budget,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl AnalysisStrategy for DirectStrategy {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        self.generate(&request.mime_type, &request.base64_image, &request.prompt)
            .await
    }
}

impl DirectStrategy {
    /// One `generateContent` call for an already-encoded image and prompt.
    /// Also used by the intermediary, which receives both over the wire.
    pub async fn generate(
        &self,
        mime_type: &str,
        base64_image: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: base64_image,
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                },
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            log::warn!("analysis: direct call failed with {status}");
            return Err(map_status(status, &detail));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|_| AnalysisError::EmptyResult)?;

        extract_text(parsed)
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Map a non-success status from the model service to an [`AnalysisError`].
pub(crate) fn map_status(status: StatusCode, body: &str) -> AnalysisError {
    let key_rejected = body.contains("API_KEY_INVALID") || body.contains("API key not valid");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::InvalidCredential,
        StatusCode::BAD_REQUEST if key_rejected => AnalysisError::InvalidCredential,
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::ServiceUnavailable(status.as_u16()),
        s if s.is_server_error() => AnalysisError::ServiceUnavailable(s.as_u16()),
        s => AnalysisError::Failed(format!("HTTP {}", s.as_u16())),
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    let text: String = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter(|p| !p.thought.unwrap_or(false))
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");

    let text = text.trim();
    if text.is_empty() {
        return Err(AnalysisError::EmptyResult);
    }
    Ok(text.to_string())
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
    thought: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_invalid_credential() {
        assert_eq!(map_status(StatusCode::UNAUTHORIZED, ""), AnalysisError::InvalidCredential);
        assert_eq!(map_status(StatusCode::FORBIDDEN, ""), AnalysisError::InvalidCredential);
        assert_eq!(
            map_status(
                StatusCode::BAD_REQUEST,
                r#"{"error":{"message":"API key not valid. Please pass a valid API key."}}"#
            ),
            AnalysisError::InvalidCredential
        );
    }

    #[test]
    fn plain_bad_request_is_generic_failure() {
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "{}"),
            AnalysisError::Failed(_)
        ));
    }

    #[test]
    fn server_errors_map_to_unavailable() {
        assert_eq!(
            map_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            AnalysisError::ServiceUnavailable(503)
        );
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            AnalysisError::ServiceUnavailable(429)
        );
    }

    #[test]
    fn request_body_pins_thinking_budget_and_inline_image() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: "AAAA",
                        },
                    },
                    Part::Text { text: "describe" },
                ],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "describe");
    }

    #[test]
    fn extract_joins_text_parts_and_skips_thoughts() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"hidden","thought":true},
                {"text":"Bus 12 "},
                {"text":"is here."}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Bus 12 is here.");
    }

    #[test]
    fn extract_without_candidates_is_empty_result() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(parsed), Err(AnalysisError::EmptyResult));
    }

    #[tokio::test]
    async fn generate_posts_to_model_endpoint_with_key_header() {
        use axum::http::{HeaderMap, Uri};
        use axum::{Json, Router};

        let app = Router::new().fallback(
            |headers: HeaderMap, uri: Uri, Json(body): Json<serde_json::Value>| async move {
                let key_ok = headers.get("x-goog-api-key").map(|v| v == "secret").unwrap_or(false);
                let text = format!(
                    "{} {} {}",
                    uri.path(),
                    key_ok,
                    body["contents"][0]["parts"][1]["text"].as_str().unwrap_or("")
                );
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": text}]}}]
                }))
            },
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = AnalysisConfig {
            model_base_url: format!("http://{addr}/v1beta/"),
            model: "vision-test".into(),
            ..AnalysisConfig::default()
        };
        let direct = DirectStrategy::new(&config, "secret");
        let text = direct.generate("image/png", "AAAA", "find the bus").await.unwrap();
        assert_eq!(text, "/v1beta/models/vision-test:generateContent true find the bus");
    }
}
