//! Review analysis orchestration: validate, classify, extract, persist.
//!
//! The pipeline is all-or-nothing with respect to persistence. A record is
//! written only when both AI stages succeed; any failure aborts the request
//! with the error kind of the failing stage and leaves the store untouched.
//! API usage already incurred by a finished stage is not rolled back.

use std::sync::Arc;

use tracing::{debug, info};

use crate::pagination::{PageRequest, ReviewPage, parse_page_params};
use crate::{
    KeyPointExtractor, KeyPoints, ReviewDraft, ReviewError, ReviewRecord, ReviewStore,
    SentimentClassifier, SentimentScore, validate_review_text,
};

/// How the two AI stages are scheduled relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageSchedule {
    /// Classify and extract at the same time. A classification failure is
    /// reported as soon as it happens; an extraction failure waits for the
    /// classifier, whose own failure then takes precedence.
    #[default]
    Concurrent,
    /// Classify, then extract. A classification failure means the extractor is
    /// never called.
    Sequential,
}

/// Sequences classifier -> extractor -> store for each request.
///
/// Holds no per-request state; clone-free sharing across tasks via `Arc`.
pub struct ReviewOrchestrator {
    classifier: Arc<dyn SentimentClassifier>,
    extractor: Arc<dyn KeyPointExtractor>,
    store: Arc<dyn ReviewStore>,
    schedule: StageSchedule,
}

impl ReviewOrchestrator {
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        extractor: Arc<dyn KeyPointExtractor>,
        store: Arc<dyn ReviewStore>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            store,
            schedule: StageSchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: StageSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn schedule(&self) -> StageSchedule {
        self.schedule
    }

    /// Analyse and persist one review.
    pub async fn analyze_review(&self, review_text: &str) -> Result<ReviewRecord, ReviewError> {
        let text = validate_review_text(review_text)?;

        let (score, key_points) = match self.schedule {
            StageSchedule::Sequential => {
                let score = self.classify(text).await?;
                let key_points = self.extract(text).await?;
                (score, key_points)
            }
            StageSchedule::Concurrent => self.classify_and_extract(text).await?,
        };

        info!(
            sentiment = %score.sentiment,
            confidence = score.confidence,
            key_points = key_points.len(),
            "review analysed"
        );

        let draft = ReviewDraft::new(text, score, key_points);
        let record = self.store.create(draft).await?;
        info!(id = record.id, "review persisted");
        Ok(record)
    }

    /// One page of stored reviews, newest first.
    pub async fn list_reviews(&self, page: i64, limit: i64) -> Result<ReviewPage, ReviewError> {
        fetch_page(self.store.as_ref(), PageRequest::normalize(page, limit)).await
    }

    /// [`list_reviews`](Self::list_reviews) from raw query-string values.
    pub async fn list_reviews_from_params(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<ReviewPage, ReviewError> {
        let (page, limit) = parse_page_params(page, limit)?;
        self.list_reviews(page, limit).await
    }

    /// Both stages at once, failing with the same kind the sequential
    /// schedule would report.
    async fn classify_and_extract(
        &self,
        text: &str,
    ) -> Result<(SentimentScore, KeyPoints), ReviewError> {
        let classify = self.classify(text);
        let extract = self.extract(text);
        tokio::pin!(classify, extract);

        tokio::select! {
            score = &mut classify => {
                let score = score?;
                Ok((score, extract.await?))
            }
            key_points = &mut extract => {
                let score = classify.await?;
                Ok((score, key_points?))
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<SentimentScore, ReviewError> {
        let score = self.classifier.analyze(text).await?;
        debug!(sentiment = %score.sentiment, confidence = score.confidence, "classified");
        Ok(score)
    }

    async fn extract(&self, text: &str) -> Result<KeyPoints, ReviewError> {
        let key_points = self.extractor.extract(text).await?;
        debug!(count = key_points.len(), "extracted key points");
        Ok(key_points)
    }
}

/// Read one normalized page from `store`.
///
/// Listing needs no AI capability, so callers holding only a store can use
/// this directly.
pub async fn fetch_page(
    store: &dyn ReviewStore,
    request: PageRequest,
) -> Result<ReviewPage, ReviewError> {
    let (total, reviews) = store.page(request.offset, request.limit).await?;
    debug!(
        page = request.page,
        limit = request.limit,
        total,
        returned = reviews.len(),
        "listed reviews"
    );
    Ok(ReviewPage::assemble(request, total, reviews))
}
