//! Precise gap measurement on the redaction's line.
//!
//! The bar's drawn box over- or under-shoots the text it covers; the true
//! target width for candidate matching is the distance between the last
//! character before the bar and the first character after it, measured from
//! character origins and boxes.

use crate::geometry::PointRect;
use crate::types::TextChar;

/// Horizontal slack, in points, when deciding whether a character clears
/// the bar's edge.
const EDGE_SLACK: f64 = 1.0;

/// The measured gap and its neighbouring characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapMeasurement {
    /// Distance from the right edge of the last character before the bar to
    /// the origin of the first character after it, clamped to >= 0.
    pub gap_pt: f64,
    pub char_before: char,
    pub char_after: char,
    /// True when the candidate must be padded with a leading space: the
    /// neighbouring character is not whitespace, so the inter-word space
    /// sits inside the gap.
    pub pad_before: bool,
    /// Likewise for a trailing space.
    pub pad_after: bool,
}

/// Measure the gap a bar leaves on its line.
///
/// Characters are taken from the bar's line with a vertical tolerance of
/// 0.8 bar heights. Returns `None` when either neighbour cannot be found
/// (bar at a line edge, or no text on the line).
pub fn measure_gap(chars: &[TextChar], bbox: PointRect) -> Option<GapMeasurement> {
    let bar_center_y = (bbox.y0 + bbox.y1) / 2.0;
    let tolerance = bbox.height() * 0.8;

    let line: Vec<&TextChar> = chars
        .iter()
        .filter(|c| (c.y_center() - bar_center_y).abs() <= tolerance)
        .collect();
    if line.is_empty() {
        return None;
    }

    let last_before = line
        .iter()
        .filter(|c| c.bbox.x1 <= bbox.x0 + EDGE_SLACK)
        .max_by(|a, b| a.bbox.x1.total_cmp(&b.bbox.x1))?;
    let first_after = line
        .iter()
        .filter(|c| c.origin.0 >= bbox.x1 - EDGE_SLACK)
        .min_by(|a, b| a.origin.0.total_cmp(&b.origin.0))?;

    let gap_pt = (first_after.origin.0 - last_before.bbox.x1).max(0.0);

    Some(GapMeasurement {
        gap_pt,
        char_before: last_before.ch,
        char_after: first_after.ch,
        pad_before: !last_before.ch.is_whitespace(),
        pad_after: !first_after.ch.is_whitespace(),
    })
}
