//! `vision-proxy`: the credential-holding intermediary for the proxied
//! analysis strategy.
//!
//! Reads the same `settings.toml` as the desktop app.  The model credential
//! comes from `analysis.api_key` or the environment variable named by
//! `analysis.api_key_env` (default `GEMINI_API_KEY`); the listen address from
//! `proxy.bind_addr`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sight_assist::analysis::DirectStrategy;
use sight_assist::config::AppConfig;
use sight_assist::proxy::{self, ProxyState, ANALYZE_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    let Some(api_key) = config.analysis.credential() else {
        bail!(
            "no model credential: set {} or analysis.api_key",
            config.analysis.api_key_env
        );
    };

    let upstream = Arc::new(DirectStrategy::new(&config.analysis, api_key));
    let app = proxy::router(ProxyState::new(upstream));

    let listener = tokio::net::TcpListener::bind(&config.proxy.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.proxy.bind_addr))?;
    log::info!(
        "vision-proxy: model {} listening on http://{}{ANALYZE_PATH}",
        config.analysis.model,
        listener.local_addr()?
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
