//! Strategy resolution and the caller-facing [`AnalysisClient`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::locale::Locale;

use super::direct::DirectStrategy;
use super::mock::MockStrategy;
use super::proxied::ProxiedStrategy;
use super::request::AnalysisRequest;
use super::strategy::{AnalysisError, AnalysisStrategy};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Where the application is running.  Only a `Local` build may hold the
/// model credential itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentContext {
    Local,
    #[default]
    Hosted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Mock,
    Direct,
    Proxied,
}

/// Pick the strategy for one request.
///
/// Mock mode wins over everything; the direct path needs both a local
/// deployment and a credential; anything else goes through the intermediary.
///
/// ```
/// use sight_assist::analysis::{select_strategy, DeploymentContext, StrategyKind};
///
/// assert_eq!(select_strategy(true, true, DeploymentContext::Local), StrategyKind::Mock);
/// assert_eq!(select_strategy(false, true, DeploymentContext::Local), StrategyKind::Direct);
/// assert_eq!(select_strategy(false, true, DeploymentContext::Hosted), StrategyKind::Proxied);
/// ```
pub fn select_strategy(
    mock_mode: bool,
    has_credential: bool,
    deployment: DeploymentContext,
) -> StrategyKind {
    if mock_mode {
        StrategyKind::Mock
    } else if has_credential && deployment == DeploymentContext::Local {
        StrategyKind::Direct
    } else {
        StrategyKind::Proxied
    }
}

// ---------------------------------------------------------------------------
// AnalysisReply
// ---------------------------------------------------------------------------

/// Outcome of [`AnalysisClient::analyze`].  Failures are values, never
/// propagated errors; each carries the localized text to present.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReply {
    Described(String),
    Failed {
        error: AnalysisError,
        message: &'static str,
    },
}

// ---------------------------------------------------------------------------
// AnalysisClient
// ---------------------------------------------------------------------------

/// Holds one instance of every strategy and dispatches each request to the
/// one [`select_strategy`] picks.
pub struct AnalysisClient {
    mock: Arc<dyn AnalysisStrategy>,
    direct: Option<Arc<dyn AnalysisStrategy>>,
    proxied: Arc<dyn AnalysisStrategy>,
    deployment: DeploymentContext,
}

impl AnalysisClient {
    pub fn new(
        mock: Arc<dyn AnalysisStrategy>,
        direct: Option<Arc<dyn AnalysisStrategy>>,
        proxied: Arc<dyn AnalysisStrategy>,
        deployment: DeploymentContext,
    ) -> Self {
        Self {
            mock,
            direct,
            proxied,
            deployment,
        }
    }

    /// Build every strategy from settings.  The direct strategy only exists
    /// when a credential can be resolved.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let direct = config.credential().map(|key| {
            Arc::new(DirectStrategy::new(config, key)) as Arc<dyn AnalysisStrategy>
        });
        log::info!(
            "analysis: deployment={:?}, credential={}",
            config.deployment,
            if direct.is_some() { "present" } else { "absent" }
        );

        Self::new(
            Arc::new(MockStrategy::new(Duration::from_millis(config.mock_delay_ms))),
            direct,
            Arc::new(ProxiedStrategy::new(config)),
            config.deployment,
        )
    }

    pub fn has_credential(&self) -> bool {
        self.direct.is_some()
    }

    pub fn strategy_for(&self, mock_mode: bool) -> StrategyKind {
        select_strategy(mock_mode, self.has_credential(), self.deployment)
    }

    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        mock_mode: bool,
        locale: &Locale,
    ) -> AnalysisReply {
        let kind = self.strategy_for(mock_mode);
        let strategy = match (kind, &self.direct) {
            (StrategyKind::Mock, _) => &self.mock,
            (StrategyKind::Direct, Some(direct)) => direct,
            _ => &self.proxied,
        };

        log::info!("analysis: {} via {kind:?}", request.task);
        match strategy.analyze(request).await {
            Ok(text) => AnalysisReply::Described(text),
            Err(error) => {
                log::warn!("analysis: {} failed: {error}", request.task);
                AnalysisReply::Failed {
                    message: error.user_message(locale),
                    error,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::EncodedFrame;
    use crate::locale;
    use crate::task::Task;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        result: Result<String, AnalysisError>,
        calls: AtomicUsize,
    }

    impl Canned {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(error: AnalysisError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AnalysisStrategy for Canned {
        async fn analyze(&self, _request: &AnalysisRequest) -> Result<String, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn request() -> AnalysisRequest {
        let frame = EncodedFrame {
            mime_type: "image/png".into(),
            base64: "AAAA".into(),
        };
        AnalysisRequest::new(Task::Explore, frame, locale::default_locale(), None, None)
    }

    #[test]
    fn mock_mode_wins_regardless_of_other_inputs() {
        for cred in [false, true] {
            for ctx in [DeploymentContext::Local, DeploymentContext::Hosted] {
                assert_eq!(select_strategy(true, cred, ctx), StrategyKind::Mock);
            }
        }
    }

    #[test]
    fn direct_requires_local_and_credential() {
        assert_eq!(
            select_strategy(false, true, DeploymentContext::Local),
            StrategyKind::Direct
        );
        assert_eq!(
            select_strategy(false, false, DeploymentContext::Local),
            StrategyKind::Proxied
        );
        assert_eq!(
            select_strategy(false, true, DeploymentContext::Hosted),
            StrategyKind::Proxied
        );
        assert_eq!(
            select_strategy(false, false, DeploymentContext::Hosted),
            StrategyKind::Proxied
        );
    }

    #[tokio::test]
    async fn dispatches_to_selected_strategy() {
        let direct = Canned::ok("direct");
        let proxied = Canned::ok("proxied");
        let client = AnalysisClient::new(
            Canned::ok("mock"),
            Some(direct.clone() as Arc<dyn AnalysisStrategy>),
            proxied.clone(),
            DeploymentContext::Local,
        );
        let en = locale::default_locale();

        assert_eq!(
            client.analyze(&request(), true, en).await,
            AnalysisReply::Described("mock".into())
        );
        assert_eq!(
            client.analyze(&request(), false, en).await,
            AnalysisReply::Described("direct".into())
        );
        assert_eq!(proxied.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn without_credential_uses_intermediary() {
        let proxied = Canned::ok("proxied");
        let client = AnalysisClient::new(
            Canned::ok("mock"),
            None,
            proxied.clone(),
            DeploymentContext::Local,
        );
        assert!(!client.has_credential());
        let reply = client
            .analyze(&request(), false, locale::default_locale())
            .await;
        assert_eq!(reply, AnalysisReply::Described("proxied".into()));
        assert_eq!(proxied.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_becomes_localized_reply() {
        let client = AnalysisClient::new(
            Canned::ok("mock"),
            None,
            Canned::err(AnalysisError::TimedOut),
            DeploymentContext::Hosted,
        );
        let es = locale::find("es-ES").unwrap();
        let reply = client.analyze(&request(), false, es).await;
        assert_eq!(
            reply,
            AnalysisReply::Failed {
                error: AnalysisError::TimedOut,
                message: es.errors.timed_out,
            }
        );
    }

    #[test]
    fn from_config_without_credential_has_no_direct() {
        let mut config = AnalysisConfig::default();
        config.api_key = None;
        config.api_key_env = "SIGHT_ASSIST_TEST_UNSET_KEY".into();
        let client = AnalysisClient::from_config(&config);
        assert!(!client.has_credential());
        assert_eq!(client.strategy_for(false), StrategyKind::Proxied);
    }

    #[test]
    fn from_config_with_key_in_local_context_goes_direct() {
        let mut config = AnalysisConfig::default();
        config.deployment = DeploymentContext::Local;
        config.api_key = Some("test-key".into());
        let client = AnalysisClient::from_config(&config);
        assert_eq!(client.strategy_for(false), StrategyKind::Direct);
        assert_eq!(client.strategy_for(true), StrategyKind::Mock);
    }
}
