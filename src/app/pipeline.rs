//! Service wiring shared by every front-end.
//!
//! The dashboard, the proxy and the one-shot commands all talk to the same
//! orchestrator and advisor; building them here keeps the front-ends focused
//! on presentation.

use std::sync::Arc;

use crate::config::Config;
use crate::data::UpstreamClient;
use crate::domain::ResolutionPolicy;
use crate::error::AppError;
use crate::fetch::FetchOrchestrator;
use crate::policy::{GeminiClient, PolicyAdvisor};

/// Orchestrator backed by the configured prediction service.
pub fn build_orchestrator(
    config: &Config,
    policy: ResolutionPolicy,
) -> Result<Arc<FetchOrchestrator>, AppError> {
    let upstream = UpstreamClient::from_config(config)?;
    tracing::info!(
        prediction_url = %config.prediction_url,
        projections_url = %config.projections_url,
        ?policy,
        "prediction service configured"
    );
    Ok(Arc::new(FetchOrchestrator::with_policy(Arc::new(upstream), policy)))
}

/// Advisor backed by Gemini; fails when `GEMINI_API_KEY` is missing.
pub fn build_advisor(config: &Config) -> Result<Arc<PolicyAdvisor>, AppError> {
    let gemini = GeminiClient::from_config(config)?;
    tracing::info!(model = %config.gemini_model, "policy generation configured");
    Ok(Arc::new(PolicyAdvisor::new(Arc::new(gemini))))
}

pub fn build_runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))
}
