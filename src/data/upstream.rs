//! HTTP client for the upstream prediction service.
//!
//! The client only moves bytes: it returns the raw JSON object and leaves
//! field resolution to [`crate::data::normalize`] and fallback decisions to the
//! orchestrator.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde_json::Value;

use crate::config::Config;
use crate::domain::Coordinate;
use crate::error::{AppError, FetchError};

/// Query parameter carrying the cache-busting stamp.
pub const CACHE_BUST_PARAM: &str = "_ts";

/// One CO2 prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRequest {
    pub coordinate: Coordinate,
    pub date: NaiveDate,
    /// Wall-clock millis at issue time; makes every request URL unique.
    pub cache_bust: i64,
}

/// One projection-series request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionsRequest {
    pub coordinate: Coordinate,
    pub cache_bust: i64,
}

/// The prediction service as seen by the orchestrator.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Fetch the raw CO2 prediction body for a coordinate and date.
    async fn fetch_metrics(&self, request: &MetricsRequest) -> Result<Value, FetchError>;

    /// Fetch the raw projection body for a coordinate.
    async fn fetch_projections(&self, request: &ProjectionsRequest) -> Result<Value, FetchError>;
}

pub struct UpstreamClient {
    client: Client,
    prediction_url: String,
    projections_url: String,
}

impl UpstreamClient {
    pub fn new(prediction_url: impl Into<String>, projections_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            prediction_url: prediction_url.into(),
            projections_url: projections_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            prediction_url: config.prediction_url.clone(),
            projections_url: config.projections_url.clone(),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .headers(no_cache_headers())
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(FetchError::Network(format!(
                "{url} answered with status {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Network(format!("failed to parse response from {url}: {e}")))?;

        if !body.is_object() {
            return Err(FetchError::Network(format!(
                "unexpected response shape from {url}: expected a JSON object"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl PredictionService for UpstreamClient {
    async fn fetch_metrics(&self, request: &MetricsRequest) -> Result<Value, FetchError> {
        let query = [
            ("latitude", format!("{:.4}", request.coordinate.lat())),
            ("longitude", format!("{:.4}", request.coordinate.lng())),
            ("date", request.date.format("%Y-%m-%d").to_string()),
            (CACHE_BUST_PARAM, request.cache_bust.to_string()),
        ];
        tracing::debug!(
            location = %request.coordinate.location_key(),
            date = %request.date,
            "requesting CO2 prediction"
        );
        self.get_json(&self.prediction_url, &query).await
    }

    async fn fetch_projections(&self, request: &ProjectionsRequest) -> Result<Value, FetchError> {
        let query = [
            ("latitude", format!("{:.4}", request.coordinate.lat())),
            ("longitude", format!("{:.4}", request.coordinate.lng())),
            (CACHE_BUST_PARAM, request.cache_bust.to_string()),
        ];
        tracing::debug!(location = %request.coordinate.location_key(), "requesting projections");
        self.get_json(&self.projections_url, &query).await
    }
}

/// Headers that ask every intermediary not to serve a cached copy.
fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cache_headers_disable_caching() {
        let headers = no_cache_headers();
        let cache_control = headers.get(CACHE_CONTROL).unwrap().to_str().unwrap();
        assert!(cache_control.contains("no-cache"));
        assert!(cache_control.contains("no-store"));
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
    }
}
