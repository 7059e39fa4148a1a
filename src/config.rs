//! Runtime configuration, loaded from the environment (and `.env`).

use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_PREDICTION_URL: &str = "http://localhost:8000/predict";
pub const DEFAULT_PROJECTIONS_URL: &str = "http://localhost:8000/projections";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    /// `PREDICTION_API_URL`: CO2 prediction endpoint.
    pub prediction_url: String,
    /// `PROJECTIONS_API_URL`: monthly projection endpoint.
    pub projections_url: String,
    /// `GEMINI_API_KEY`: only needed for policy generation.
    pub gemini_api_key: Option<String>,
    /// `GEMINI_MODEL`
    pub gemini_model: String,
    /// `PORT`: proxy listen port.
    pub port: u16,
    /// `UPSTREAM_TIMEOUT_SECS`: unset means no timeout.
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::new(2, format!("Invalid PORT '{raw}': {e}")))?,
            None => DEFAULT_PORT,
        };

        let upstream_timeout = match non_empty("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    AppError::new(2, format!("Invalid UPSTREAM_TIMEOUT_SECS '{raw}': {e}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            prediction_url: non_empty("PREDICTION_API_URL")
                .unwrap_or_else(|| DEFAULT_PREDICTION_URL.to_string()),
            projections_url: non_empty("PROJECTIONS_API_URL")
                .unwrap_or_else(|| DEFAULT_PROJECTIONS_URL.to_string()),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            port,
            upstream_timeout,
        })
    }

    /// The Gemini key, or a configuration error naming the missing variable.
    pub fn require_gemini_key(&self) -> Result<&str, AppError> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| AppError::new(2, "Missing GEMINI_API_KEY in environment (.env)."))
    }
}
