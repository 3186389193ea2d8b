//! Sentiment classification through the Hugging Face inference API.

use std::time::Duration;

use async_trait::async_trait;
use revlens_core::{ReviewError, SentimentClassifier, SentimentScore, validate_review_text};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AdapterError;
use crate::labels::{MAX_INPUT_CHARS, map_label, truncate_chars};

/// Multilingual three-class model covering English and Indonesian.
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-xlm-roberta-base-sentiment-multilingual";
pub const DEFAULT_HF_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

#[derive(Debug, Clone)]
pub struct HfConfig {
    pub base_url: String,
    pub model: String,
    /// Bearer token; requests go out unauthenticated without one.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for HfConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HF_BASE_URL.to_string(),
            model: DEFAULT_SENTIMENT_MODEL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`SentimentClassifier`] backed by a hosted text-classification model.
pub struct HfSentimentClassifier {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

/// The API nests predictions per input for batched calls and not otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
}

impl InferenceResponse {
    fn best(self) -> Option<Prediction> {
        let predictions = match self {
            Self::Nested(batches) => batches.into_iter().next()?,
            Self::Flat(predictions) => predictions,
        };
        predictions
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

impl HfSentimentClassifier {
    pub fn new(config: HfConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!("{}/{}", config.base_url.trim_end_matches('/'), config.model);
        info!(endpoint = %endpoint, "configured hosted sentiment classifier");
        Ok(Self {
            client,
            endpoint,
            token: config.token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn classify(&self, input: &str) -> Result<Prediction, AdapterError> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .json(&InferenceRequest { inputs: input });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = AdapterError::check(req.send().await?).await?;
        let body: InferenceResponse = resp.json().await?;
        body.best()
            .ok_or_else(|| AdapterError::Malformed("empty prediction list".into()))
    }
}

#[async_trait]
impl SentimentClassifier for HfSentimentClassifier {
    async fn analyze(&self, text: &str) -> Result<SentimentScore, ReviewError> {
        let text = validate_review_text(text)?;
        let input = truncate_chars(text, MAX_INPUT_CHARS);

        let best = self.classify(input).await.map_err(ReviewError::analysis)?;
        debug!(label = %best.label, score = best.score, "classifier prediction");
        SentimentScore::new(map_label(&best.label), best.score)
    }
}
