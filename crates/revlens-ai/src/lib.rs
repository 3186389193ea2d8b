//! Inference adapters: hosted and local sentiment classifiers, Gemini key point extraction.

mod error;
pub use error::AdapterError;

pub mod keypoints;
pub mod labels;

mod gemini;
pub use gemini::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, GEMINI_KEY_VARS, GeminiConfig, GeminiExtractor,
};

mod huggingface;
pub use huggingface::{
    DEFAULT_HF_BASE_URL, DEFAULT_SENTIMENT_MODEL, HfConfig, HfSentimentClassifier,
};

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxSentimentClassifier;
