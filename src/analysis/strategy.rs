//! Core `AnalysisStrategy` trait and the analysis error taxonomy.

use async_trait::async_trait;
use thiserror::Error;

use crate::locale::Locale;

use super::request::AnalysisRequest;

// ---------------------------------------------------------------------------
// AnalysisError
// ---------------------------------------------------------------------------

/// Errors a strategy can report.  Every variant has a localized,
/// user-presentable message via [`AnalysisError::user_message`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The client-held credential was rejected or lacks permission.
    #[error("credential rejected by the model service")]
    InvalidCredential,

    /// The intermediary refused the caller (HTTP 401 / 403).
    #[error("not authorized by the analysis intermediary")]
    NotAuthorized,

    /// The service answered with a server-side failure (5xx, 429).
    #[error("analysis service unavailable (HTTP {0})")]
    ServiceUnavailable(u16),

    /// Transport error before any HTTP status was received.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request exceeded the configured timeout.
    #[error("analysis request timed out")]
    TimedOut,

    /// The response had no usable text.
    #[error("analysis returned no text")]
    EmptyResult,

    /// Any other failure, with a short diagnostic.
    #[error("analysis failed: {0}")]
    Failed(String),
}

impl AnalysisError {
    /// The message shown in the status line and spoken to the user.
    pub fn user_message(&self, locale: &Locale) -> &'static str {
        let e = &locale.errors;
        match self {
            AnalysisError::InvalidCredential => e.invalid_credential,
            AnalysisError::NotAuthorized => e.not_authorized,
            AnalysisError::ServiceUnavailable(_) => e.service_unavailable,
            AnalysisError::ConnectionFailed(_) => e.connection_failed,
            AnalysisError::TimedOut => e.timed_out,
            AnalysisError::EmptyResult => e.empty_result,
            AnalysisError::Failed(_) => e.analysis_failed,
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::TimedOut
        } else if e.is_connect() || e.is_request() {
            AnalysisError::ConnectionFailed(e.to_string())
        } else {
            AnalysisError::Failed(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisStrategy trait
// ---------------------------------------------------------------------------

/// One way of turning an image + prompt into descriptive text.
///
/// Implementors must be `Send + Sync` so they can be held behind
/// `Arc<dyn AnalysisStrategy>` by the [`AnalysisClient`](super::AnalysisClient).
#[async_trait]
pub trait AnalysisStrategy: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}
