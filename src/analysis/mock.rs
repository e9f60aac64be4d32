//! Simulated analysis for exercising the UI and voice flow without a model.

use std::time::Duration;

use async_trait::async_trait;

use crate::locale;

use super::request::AnalysisRequest;
use super::strategy::{AnalysisError, AnalysisStrategy};

/// Returns the locale's canned answer for the request's task after a fixed
/// delay.  Never fails and never touches the network.
#[derive(Debug, Clone)]
pub struct MockStrategy {
    delay: Duration,
}

impl MockStrategy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockStrategy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl AnalysisStrategy for MockStrategy {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let locale = locale::find_or_default(request.locale_code);
        log::debug!("analysis: mock response for {}", request.task);
        Ok(locale.mock_response(request.task).to_string())
    }
}
