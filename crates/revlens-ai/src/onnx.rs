//! Local sentiment classification with ONNX Runtime.
//!
//! The model directory must contain `model.onnx`, `tokenizer.json` and the
//! Hugging Face `config.json` carrying `id2label`. Any sequence-classification
//! export works; labels go through the same mapping as the hosted classifier.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use revlens_core::{ReviewError, SentimentClassifier, SentimentScore, validate_review_text};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::labels::map_label;

/// Token limit of XLM-RoBERTa style encoders.
const MAX_TOKENS: usize = 512;

/// [`SentimentClassifier`] running a sequence-classification model in-process.
///
/// Inference needs `&mut Session`, so the model sits behind a mutex and each
/// call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct OnnxSentimentClassifier {
    model: Arc<Mutex<OnnxModel>>,
}

struct OnnxModel {
    session: Session,
    tokenizer: Tokenizer,
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct ModelConfig {
    id2label: BTreeMap<String, String>,
}

impl OnnxSentimentClassifier {
    /// Load a classifier from a directory with `model.onnx`, `tokenizer.json` and `config.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let labels = read_labels(&config_path)?;
        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        info!(model = %model_path.display(), labels = ?labels, "loaded sentiment model");
        Ok(Self {
            model: Arc::new(Mutex::new(OnnxModel {
                session,
                tokenizer,
                labels,
            })),
        })
    }
}

impl OnnxModel {
    /// Top label and its softmax probability.
    fn predict(&mut self, text: &str) -> anyhow::Result<(String, f32)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let shape = [1i64, input_ids.len() as i64];

        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
        ])?;

        // Logits: [1, num_labels].
        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[0] == 1 && dims[1] as usize == self.labels.len(),
            "unexpected output shape: {dims:?}, expected [1, {}]",
            self.labels.len()
        );

        let probs = softmax(logits);
        let (idx, prob) = argmax(&probs).ok_or_else(|| anyhow::anyhow!("model returned no logits"))?;
        Ok((self.labels[idx].clone(), prob))
    }
}

#[async_trait]
impl SentimentClassifier for OnnxSentimentClassifier {
    async fn analyze(&self, text: &str) -> Result<SentimentScore, ReviewError> {
        let text = validate_review_text(text)?.to_string();
        let model = Arc::clone(&self.model);

        let (label, prob) = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| anyhow::anyhow!("model lock poisoned"))?;
            model.predict(&text)
        })
        .await
        .map_err(ReviewError::analysis)?
        .map_err(ReviewError::analysis)?;

        debug!(label = %label, prob, "local classifier prediction");
        SentimentScore::new(map_label(&label), f64::from(prob))
    }
}

/// Labels ordered by class index, from a `config.json` `id2label` map.
fn read_labels(config_path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("read {config_path:?}: {e}"))?;
    let config: ModelConfig = serde_json::from_str(&text)?;

    let mut indexed = config
        .id2label
        .into_iter()
        .map(|(id, label)| Ok((id.parse::<usize>()?, label)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    indexed.sort_by_key(|(id, _)| *id);

    anyhow::ensure!(!indexed.is_empty(), "id2label is empty in {config_path:?}");
    for (pos, (id, _)) in indexed.iter().enumerate() {
        anyhow::ensure!(*id == pos, "id2label is missing class {pos}");
    }
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}
