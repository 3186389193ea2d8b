//! Key point extraction through the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use revlens_core::{KeyPointExtractor, KeyPoints, ReviewError, validate_review_text};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AdapterError;
use crate::keypoints::{build_prompt, parse_key_points};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked, in order, for the Gemini API key.
pub const GEMINI_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "GEMINI_API_TOKEN", "GOOGLE_API_KEY"];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// First non-empty value among [`GEMINI_KEY_VARS`].
    pub fn api_key_from_env() -> Option<String> {
        first_non_empty(GEMINI_KEY_VARS.iter().map(|var| std::env::var(var).ok()))
    }
}

fn first_non_empty(values: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

/// [`KeyPointExtractor`] backed by a Gemini model.
pub struct GeminiExtractor {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiExtractor {
    pub fn new(config: GeminiConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let url = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        info!(model = %config.model, "configured key point extractor");
        Ok(Self {
            client,
            url,
            api_key: config.api_key,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, AdapterError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                response_mime_type: "application/json",
            },
        };

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let body: GenerateResponse = AdapterError::check(resp).await?.json().await?;
        Ok(body.text())
    }
}

#[async_trait]
impl KeyPointExtractor for GeminiExtractor {
    async fn extract(&self, text: &str) -> Result<KeyPoints, ReviewError> {
        let text = validate_review_text(text)?;
        let raw = self
            .generate(&build_prompt(text))
            .await
            .map_err(ReviewError::extraction)?;
        debug!(len = raw.len(), "extractor response");

        parse_key_points(&raw)
            .ok_or_else(|| ReviewError::extraction(AdapterError::Malformed("empty response".into())))
    }
}
