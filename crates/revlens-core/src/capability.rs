//! Seams between the pipeline and its collaborators.
//!
//! Implementations are long-lived: built once at process start, shared behind
//! `Arc`, and called concurrently from many requests.

use async_trait::async_trait;

use crate::{KeyPoints, ReviewDraft, ReviewError, ReviewRecord, SentimentScore};

/// Maps review text to a sentiment label and confidence.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify `text`.
    ///
    /// Blank text fails with [`ReviewError::Validation`] before any model call;
    /// every other failure is [`ReviewError::Analysis`].
    async fn analyze(&self, text: &str) -> Result<SentimentScore, ReviewError>;
}

/// Extracts 1-5 key points, in the input's language.
#[async_trait]
pub trait KeyPointExtractor: Send + Sync {
    /// Extract key points from `text`.
    ///
    /// Unparseable model output is absorbed into a single-point list; only
    /// service failures surface, as [`ReviewError::Extraction`].
    async fn extract(&self, text: &str) -> Result<KeyPoints, ReviewError>;
}

/// Durable storage of analysed reviews.
///
/// `create` is atomic. `list` returns newest first by `created_at`, ties
/// broken by `id` descending. Failures are [`ReviewError::Persistence`].
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a draft, assigning `id` and `created_at`.
    async fn create(&self, draft: ReviewDraft) -> Result<ReviewRecord, ReviewError>;

    /// Total number of stored reviews.
    async fn count(&self) -> Result<u64, ReviewError>;

    /// A window of reviews, newest first.
    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<ReviewRecord>, ReviewError>;

    /// The total and a window read from one snapshot, so the window never
    /// reflects writes the total does not.
    async fn page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(u64, Vec<ReviewRecord>), ReviewError>;
}
