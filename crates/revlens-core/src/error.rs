use thiserror::Error;

/// Boxed error carried by the external-failure variants of [`ReviewError`].
///
/// The cause is rendered in the variant's message and is not repeated as
/// `source()`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single analysis or listing request.
///
/// Each variant maps to one caller-visible outcome. None of them is fatal to the
/// process: a failed request leaves other requests unaffected.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Empty review text or malformed pagination parameters. No side effects.
    #[error("{0}")]
    Validation(String),

    /// The sentiment classifier was unreachable, rejected the input, or
    /// returned something unusable.
    #[error("Sentiment analysis failed: {0}")]
    Analysis(BoxError),

    /// The key point extractor's service call failed.
    #[error("Key points extraction failed: {0}")]
    Extraction(BoxError),

    /// The store rejected the record or could not be read.
    #[error("Database error: {0}")]
    Persistence(BoxError),
}

/// Discriminant of [`ReviewError`], for callers that only need the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Analysis,
    Extraction,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Analysis => "analysis",
            Self::Extraction => "extraction",
            Self::Persistence => "persistence",
        }
    }
}

impl ReviewError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn analysis(err: impl Into<BoxError>) -> Self {
        Self::Analysis(err.into())
    }

    pub fn extraction(err: impl Into<BoxError>) -> Self {
        Self::Extraction(err.into())
    }

    pub fn persistence(err: impl Into<BoxError>) -> Self {
        Self::Persistence(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Analysis(_) => ErrorKind::Analysis,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
