//! Prompt construction and response parsing for key point extraction.
//!
//! The generative model is asked for a bare JSON array of strings. Its reply
//! is treated as an opaque string: fences are stripped, the remainder parsed,
//! and anything unparseable becomes a single key point instead of an error.

use revlens_core::KeyPoints;
use serde_json::Value;
use tracing::warn;

const PROMPT_TEMPLATE: &str = "\
Analyze the following product review and extract its key points.
IMPORTANT: Respond in the SAME language as the review text below.

Review: {review}

Extract 3-5 key points from this review. Return ONLY a JSON array of strings, nothing else.
Example format: [\"point 1\", \"point 2\", \"point 3\"]

If the review is in Indonesian, respond in Indonesian.
If the review is in English, respond in English.
Keep each point concise (1-2 sentences maximum).";

/// The extraction prompt for one review.
pub fn build_prompt(review_text: &str) -> String {
    PROMPT_TEMPLATE.replace("{review}", review_text)
}

/// Turn a raw model reply into key points.
///
/// Returns `None` only for a blank reply. A reply that is not a JSON array of
/// usable entries falls back to the whole (fence-stripped) reply as one point.
/// Arrays longer than five are cut to the first five.
pub fn parse_key_points(raw: &str) -> Option<KeyPoints> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let body = strip_code_fence(raw);
    if let Some(points) = parse_array(body) {
        return Some(points);
    }

    warn!(response = body, "could not parse key points as a JSON array, keeping raw text");
    let fallback = if body.is_empty() { raw } else { body };
    Some(KeyPoints::single(fallback))
}

/// Content of a leading Markdown code fence, minus an optional `json` tag.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let inner = rest.split("```").next().unwrap_or(rest);
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.trim()
}

fn parse_array(text: &str) -> Option<KeyPoints> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return None;
    };
    let points: Vec<String> = items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .filter(|s| !s.is_empty())
        .collect();
    KeyPoints::new(points).ok()
}
