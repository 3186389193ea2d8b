//! Core types, pagination policy, capability traits, and the analysis pipeline.

mod capability;
mod error;
pub mod pagination;
pub mod pipeline;
pub mod review;

pub use capability::{KeyPointExtractor, ReviewStore, SentimentClassifier};
pub use error::{BoxError, ErrorKind, ReviewError};
pub use pagination::{PageRequest, ReviewPage};
pub use pipeline::{ReviewOrchestrator, StageSchedule, fetch_page};
pub use review::{
    KeyPoints, KeyPointsError, MAX_KEY_POINTS, ReviewDraft, ReviewRecord, Sentiment,
    SentimentScore, validate_review_text,
};
