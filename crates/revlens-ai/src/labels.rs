//! Mapping from model-native sentiment labels onto the closed three-label set.

use revlens_core::Sentiment;
use tracing::warn;

/// Longest input, in characters, submitted to a hosted classifier.
///
/// Longer text is cut to this prefix; the model's own tokenizer limit is
/// around 512 tokens, which is never fewer characters.
pub const MAX_INPUT_CHARS: usize = 512;

/// Map a native label (`positive`, `pos`, `NEG`, ...) onto [`Sentiment`].
///
/// Unrecognised labels become [`Sentiment::Neutral`].
pub fn map_label(native: &str) -> Sentiment {
    match native.trim().to_ascii_lowercase().as_str() {
        "positive" | "pos" => Sentiment::Positive,
        "negative" | "neg" => Sentiment::Negative,
        "neutral" | "neu" => Sentiment::Neutral,
        other => {
            warn!(label = other, "unrecognised sentiment label, using neutral");
            Sentiment::Neutral
        }
    }
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
