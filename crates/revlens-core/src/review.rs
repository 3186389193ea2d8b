//! The persisted review shape and the value types that feed it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ReviewError;

/// Upper bound on key points kept per review.
pub const MAX_KEY_POINTS: usize = 5;

/// Decimal digits kept on a confidence score.
pub const CONFIDENCE_DECIMALS: i32 = 4;

/// Closed set of sentiment labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Parse one of the three canonical labels (as stored). Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output: a label plus a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub sentiment: Sentiment,
    pub confidence: f64,
}

impl SentimentScore {
    /// Build a score, rounding the confidence to [`CONFIDENCE_DECIMALS`] digits.
    ///
    /// Non-finite or out-of-range confidences are an [`ReviewError::Analysis`]:
    /// the classifier returned something unusable.
    pub fn new(sentiment: Sentiment, confidence: f64) -> Result<Self, ReviewError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ReviewError::analysis(format!(
                "classifier returned confidence {confidence} outside [0, 1]"
            )));
        }
        Ok(Self {
            sentiment,
            confidence: round_confidence(confidence),
        })
    }
}

/// Round to [`CONFIDENCE_DECIMALS`] decimal digits.
pub fn round_confidence(value: f64) -> f64 {
    let scale = 10f64.powi(CONFIDENCE_DECIMALS);
    (value * scale).round() / scale
}

#[derive(Debug, Error)]
pub enum KeyPointsError {
    #[error("key points must contain at least one entry")]
    Empty,
    #[error("stored key points are not a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered list of 1 to [`MAX_KEY_POINTS`] short strings.
///
/// Stored and serialized as a single JSON-array text blob, e.g.
/// `["Fast shipping","Sturdy build"]`, but handled as a list everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPoints(Vec<String>);

impl KeyPoints {
    /// Keep the first [`MAX_KEY_POINTS`] entries. Rejects an empty list.
    pub fn new(mut points: Vec<String>) -> Result<Self, KeyPointsError> {
        if points.is_empty() {
            return Err(KeyPointsError::Empty);
        }
        points.truncate(MAX_KEY_POINTS);
        Ok(Self(points))
    }

    /// A list holding exactly one point.
    pub fn single(point: impl Into<String>) -> Self {
        Self(vec![point.into()])
    }

    /// Parse the stored JSON-array text form.
    pub fn from_json(text: &str) -> Result<Self, KeyPointsError> {
        let points: Vec<String> = serde_json::from_str(text)?;
        Self::new(points)
    }

    /// The stored JSON-array text form. Non-ASCII text is kept as-is.
    pub fn to_json(&self) -> String {
        // Serializing a Vec<String> cannot fail.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Serialize for KeyPoints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_json())
    }
}

impl<'de> Deserialize<'de> for KeyPoints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_json(&text).map_err(de::Error::custom)
    }
}

/// A review ready to persist: everything but the store-assigned fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub review_text: String,
    pub sentiment: Sentiment,
    pub confidence_score: f64,
    pub key_points: KeyPoints,
}

impl ReviewDraft {
    pub fn new(review_text: impl Into<String>, score: SentimentScore, key_points: KeyPoints) -> Self {
        Self {
            review_text: review_text.into(),
            sentiment: score.sentiment,
            confidence_score: score.confidence,
            key_points,
        }
    }

    /// Attach the fields the store assigns on creation.
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> ReviewRecord {
        ReviewRecord {
            id,
            review_text: self.review_text,
            sentiment: self.sentiment,
            confidence_score: self.confidence_score,
            key_points: self.key_points,
            created_at,
        }
    }
}

/// A fully analysed, persisted review.
///
/// Only exists once both AI stages succeeded and the store accepted it;
/// never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub review_text: String,
    pub sentiment: Sentiment,
    pub confidence_score: f64,
    pub key_points: KeyPoints,
    /// UTC, serialized as RFC 3339.
    pub created_at: DateTime<Utc>,
}

/// Trim review text, rejecting empty or whitespace-only input.
pub fn validate_review_text(text: &str) -> Result<&str, ReviewError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ReviewError::validation(
            "review_text is required and cannot be empty",
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::TimeZone;

    fn sample_record() -> ReviewRecord {
        let draft = ReviewDraft::new(
            "Kualitas bagus, pengiriman cepat",
            SentimentScore::new(Sentiment::Positive, 0.97123456).unwrap(),
            KeyPoints::new(vec!["Kualitas bagus".into(), "Pengiriman cepat".into()]).unwrap(),
        );
        draft.into_record(7, Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap())
    }

    #[test]
    fn confidence_rounded_to_four_digits() {
        let score = SentimentScore::new(Sentiment::Neutral, 0.812_345_6).unwrap();
        assert_eq!(score.confidence, 0.8123);

        let score = SentimentScore::new(Sentiment::Neutral, 0.812_36).unwrap();
        assert_eq!(score.confidence, 0.8124);
    }

    #[test]
    fn confidence_bounds_inclusive() {
        assert_eq!(SentimentScore::new(Sentiment::Positive, 0.0).unwrap().confidence, 0.0);
        assert_eq!(SentimentScore::new(Sentiment::Positive, 1.0).unwrap().confidence, 1.0);
    }

    #[test]
    fn confidence_out_of_range_is_analysis_error() {
        for bad in [-0.01, 1.5, f64::NAN, f64::INFINITY] {
            let err = SentimentScore::new(Sentiment::Positive, bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Analysis, "value {bad}");
        }
    }

    #[test]
    fn key_points_truncated_to_five() {
        let points: Vec<String> = (1..=7).map(|i| format!("point {i}")).collect();
        let kp = KeyPoints::new(points).unwrap();
        assert_eq!(kp.len(), 5);
        assert_eq!(kp.as_slice()[0], "point 1");
        assert_eq!(kp.as_slice()[4], "point 5");
    }

    #[test]
    fn key_points_reject_empty() {
        assert!(matches!(KeyPoints::new(vec![]), Err(KeyPointsError::Empty)));
        assert!(matches!(KeyPoints::from_json("[]"), Err(KeyPointsError::Empty)));
    }

    #[test]
    fn key_points_json_keeps_unicode() {
        let kp = KeyPoints::new(vec!["Sangat puas 👍".into(), "Harga terjangkau".into()]).unwrap();
        assert_eq!(kp.to_json(), r#"["Sangat puas 👍","Harga terjangkau"]"#);
        assert_eq!(KeyPoints::from_json(&kp.to_json()).unwrap(), kp);
    }

    #[test]
    fn key_points_from_invalid_json() {
        assert!(matches!(KeyPoints::from_json("not json"), Err(KeyPointsError::Json(_))));
        assert!(matches!(KeyPoints::from_json(r#"{"a":1}"#), Err(KeyPointsError::Json(_))));
    }

    #[test]
    fn record_serializes_with_expected_keys() {
        let value = serde_json::to_value(sample_record()).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["confidence_score", "created_at", "id", "key_points", "review_text", "sentiment"]
        );

        assert_eq!(obj["id"], 7);
        assert_eq!(obj["sentiment"], "positive");
        assert_eq!(obj["confidence_score"], 0.9712);
        assert_eq!(obj["key_points"], r#"["Kualitas bagus","Pengiriman cepat"]"#);
        assert_eq!(obj["created_at"], "2026-03-01T12:30:00Z");
    }

    #[test]
    fn record_deserializes_from_wire_form() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        let parsed: ReviewRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample_record());
    }

    #[test]
    fn sentiment_parse_is_canonical_only() {
        assert_eq!(Sentiment::parse(" Positive "), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("neutral"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse("neg"), None);
    }

    #[test]
    fn validate_trims_and_rejects_blank() {
        assert_eq!(validate_review_text("  great mug \n").unwrap(), "great mug");
        for blank in ["", "   ", "\n\t "] {
            let err = validate_review_text(blank).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }
}
