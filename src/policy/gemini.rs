//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, FetchError};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A generative-text service: prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, FetchError>;
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_API_BASE.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from config; fails when `GEMINI_API_KEY` is missing.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let api_key = config.require_gemini_key()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: GEMINI_API_BASE.to_string(),
            model: config.gemini_model.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// Point the client at a different API root (a local fake in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, FetchError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "calling Gemini");

        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::PolicyGeneration(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::PolicyGeneration(format!(
                "model {} answered with status {status}",
                self.model
            )));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::PolicyGeneration(format!("unreadable response: {e}")))?;

        let text = response_text(parsed);
        if text.trim().is_empty() {
            return Err(FetchError::PolicyGeneration("model returned no text".to_string()));
        }
        Ok(text)
    }
}

/// Concatenated text parts of the first candidate.
fn response_text(resp: GenerateResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_has_gemini_shape() {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "hello" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]}));
    }

    #[test]
    fn text_is_joined_from_first_candidate() {
        let resp: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "1. Plant trees.\n"}, {"text": "2. Walk more."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response_text(resp), "1. Plant trees.\n2. Walk more.");
    }

    #[test]
    fn blocked_response_has_no_text() {
        let resp: GenerateResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(response_text(resp), "");
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("k", "gemini-1.5-flash").with_base_url("http://127.0.0.1:9/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
