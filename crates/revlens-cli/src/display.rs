//! Terminal rendering for review records and pages.

use revlens_core::{ReviewPage, ReviewRecord};

const LABEL_WIDTH: usize = 12;
const PREVIEW_CHARS: usize = 60;

// ── Single record ──

/// A vertical card: header, text, then labelled fields and key points.
pub fn render_card(record: &ReviewRecord) -> String {
    let mut out = format!("=== Review #{} ===\n", record.id);
    out.push_str(&format!("{}\n\n", record.review_text));

    field(&mut out, "sentiment", record.sentiment.as_str());
    field(&mut out, "confidence", &format!("{:.4}", record.confidence_score));
    field(
        &mut out,
        "created_at",
        &record.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    out.push_str(&format!("  key points ({}):\n", record.key_points.len()));
    for (i, point) in record.key_points.as_slice().iter().enumerate() {
        out.push_str(&format!("    {}. {}\n", i + 1, point));
    }
    out
}

fn field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("  {:<width$} {}\n", label, value, width = LABEL_WIDTH));
}

// ── Page ──

/// One line per review followed by a page footer.
pub fn render_page(page: &ReviewPage) -> String {
    if page.reviews.is_empty() {
        return format!(
            "No reviews on page {} ({} total)\n",
            page.page, page.total
        );
    }

    let mut out = format!(
        "{:>6}  {:<16}  {:<8}  {:>6}  {}\n",
        "id", "created", "label", "conf", "review"
    );
    for r in &page.reviews {
        out.push_str(&format!(
            "{:>6}  {:<16}  {:<8}  {:>6.4}  {}\n",
            r.id,
            r.created_at.format("%Y-%m-%d %H:%M"),
            r.sentiment.as_str(),
            r.confidence_score,
            preview(&r.review_text),
        ));
    }
    out.push_str(&format!(
        "page {}/{} ({} reviews, {} per page)\n",
        page.page,
        page.total_pages.max(1),
        page.total,
        page.limit
    ));
    out
}

/// First line of `text`, cut to [`PREVIEW_CHARS`] characters with an ellipsis.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut chars = line.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() || line.len() < text.len() {
        format!("{head}…")
    } else {
        head
    }
}
