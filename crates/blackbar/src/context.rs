//! Textual context around a redaction.
//!
//! Classifies the page's text spans relative to a detection box, estimates
//! how many characters the bar hides from nearby font metrics, and collects
//! truncated before/after context in reading order.

use crate::geometry::PointRect;
use crate::types::TextSpan;

/// Spans within this many points of the box on any side count as nearby.
const NEARBY_PROXIMITY: f64 = 50.0;
/// Same-line fallback tolerance on the vertical centre, in points.
const SAME_LINE_TOLERANCE: f64 = 20.0;
/// Vertical slack when deciding whether a span shares the redaction's line
/// for before/after classification.
const READING_ORDER_SLACK: f64 = 5.0;
/// Fallback average character width when no text is adjacent.
const FALLBACK_CHAR_WIDTH: f64 = 6.0;

/// Result of context extraction and character estimation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSummary {
    pub text_before: String,
    pub text_after: String,
    pub estimated_chars: u32,
    /// Absent when no adjacent text exists.
    pub font_size_nearby: Option<f64>,
    /// Absent when no adjacent text exists.
    pub avg_char_width: Option<f64>,
}

/// Spans whose box, expanded by the proximity margin, touches the redaction.
fn nearby_spans<'a>(spans: &'a [TextSpan], bbox: &PointRect) -> Vec<&'a TextSpan> {
    spans
        .iter()
        .filter(|s| {
            s.bbox.x1 >= bbox.x0 - NEARBY_PROXIMITY
                && s.bbox.x0 <= bbox.x1 + NEARBY_PROXIMITY
                && s.bbox.y1 >= bbox.y0 - NEARBY_PROXIMITY
                && s.bbox.y0 <= bbox.y1 + NEARBY_PROXIMITY
        })
        .collect()
}

/// Spans sharing the redaction's line, by vertical centre.
fn same_line_spans<'a>(spans: &'a [TextSpan], bbox: &PointRect) -> Vec<&'a TextSpan> {
    let center_y = (bbox.y0 + bbox.y1) / 2.0;
    spans
        .iter()
        .filter(|s| (s.y_center() - center_y).abs() <= SAME_LINE_TOLERANCE)
        .collect()
}

/// Weighted-average character width over `spans`, then bar width divided by
/// it. Falls back to a 6 pt average when no metrics are available.
fn estimate_chars(bbox: &PointRect, spans: &[&TextSpan]) -> (u32, Option<f64>, Option<f64>) {
    let width = bbox.width();
    if spans.is_empty() {
        let estimated = (width / FALLBACK_CHAR_WIDTH).round().max(1.0) as u32;
        return (estimated, None, None);
    }

    let mut total_chars = 0usize;
    let mut total_width = 0.0;
    let mut font_sizes = 0.0;
    for span in spans {
        let count = span.text.chars().count();
        total_chars += count;
        total_width += span.char_width * count as f64;
        font_sizes += span.font_size;
    }
    if total_chars == 0 {
        let estimated = (width / FALLBACK_CHAR_WIDTH).round().max(1.0) as u32;
        return (estimated, None, None);
    }

    let avg_char_width = total_width / total_chars as f64;
    let avg_font_size = font_sizes / spans.len() as f64;
    let estimated = (width / avg_char_width).round().max(1.0) as u32;
    (estimated, Some(avg_font_size), Some(avg_char_width))
}

/// Concatenate before/after context in reading order and truncate to
/// `context_chars`, eliding at the far end from the gap.
fn extract_before_after(
    spans: &[TextSpan],
    bbox: &PointRect,
    context_chars: usize,
) -> (String, String) {
    let (cx, cy) = bbox.center();

    let mut before: Vec<&TextSpan> = Vec::new();
    let mut after: Vec<&TextSpan> = Vec::new();
    for span in spans {
        let sy = span.y_center();
        let sx = (span.bbox.x0 + span.bbox.x1) / 2.0;
        if sy < cy - READING_ORDER_SLACK {
            before.push(span);
        } else if sy > cy + READING_ORDER_SLACK {
            after.push(span);
        } else if sx < cx {
            before.push(span);
        } else {
            after.push(span);
        }
    }

    let reading_order = |a: &&TextSpan, b: &&TextSpan| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    };
    before.sort_by(reading_order);
    after.sort_by(reading_order);

    let join = |spans: &[&TextSpan]| {
        spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut text_before = join(&before);
    let mut text_after = join(&after);

    if text_before.chars().count() > context_chars {
        let keep = context_chars.saturating_sub(1);
        let tail: String = text_before
            .chars()
            .rev()
            .take(keep)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        text_before = format!("…{tail}");
    }
    if text_after.chars().count() > context_chars {
        let keep = context_chars.saturating_sub(1);
        let head: String = text_after.chars().take(keep).collect();
        text_after = format!("{head}…");
    }

    (
        text_before.trim().to_string(),
        text_after.trim().to_string(),
    )
}

/// Full context analysis for one detection box.
pub fn analyze_context(
    spans: &[TextSpan],
    bbox: &PointRect,
    context_chars: usize,
) -> ContextSummary {
    let mut metric_spans = nearby_spans(spans, bbox);
    if metric_spans.is_empty() {
        metric_spans = same_line_spans(spans, bbox);
    }

    let (estimated_chars, font_size_nearby, avg_char_width) = estimate_chars(bbox, &metric_spans);
    let (text_before, text_after) = extract_before_after(spans, bbox, context_chars);

    ContextSummary {
        text_before,
        text_after,
        estimated_chars,
        font_size_nearby,
        avg_char_width,
    }
}
