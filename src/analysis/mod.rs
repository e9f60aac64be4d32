//! Image analysis: turns a captured frame plus a task prompt into text.
//!
//! # Architecture
//!
//! ```text
//!   AnalysisRequest ──▶ AnalysisClient ──select_strategy──┬─▶ MockStrategy
//!                                                         ├─▶ DirectStrategy  (model API, local key)
//!                                                         └─▶ ProxiedStrategy (intermediary)
//! ```
//!
//! Strategy selection is re-evaluated for every request so that toggling
//! mock mode takes effect immediately.

pub mod client;
pub mod direct;
pub mod mock;
pub mod proxied;
pub mod request;
pub mod strategy;

pub use client::{select_strategy, AnalysisClient, AnalysisReply, DeploymentContext, StrategyKind};
pub use direct::DirectStrategy;
pub use mock::MockStrategy;
pub use proxied::{ProxiedStrategy, ProxyRequest, ProxyResponse};
pub use request::{compose_prompt, AnalysisRequest};
pub use strategy::{AnalysisError, AnalysisStrategy};
