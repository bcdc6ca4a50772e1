//! Multi-line redaction grouping.
//!
//! A redaction that runs to the right margin and resumes at the left margin
//! of the following line is one logical redaction split by the line break.
//! Members of a group share a `multiline_group_id` and carry their position
//! within it; singletons remain unmarked.

use uuid::Uuid;

use crate::types::Redaction;

/// Fallback line height when a page has no redactions to estimate from.
const DEFAULT_LINE_HEIGHT: f64 = 14.0;

/// Estimate the page's line height from the bars themselves: bars are
/// slightly shorter than their text line, so scale the median height up.
fn estimate_line_height(redactions: &[Redaction]) -> f64 {
    if redactions.is_empty() {
        return DEFAULT_LINE_HEIGHT;
    }
    let mut heights: Vec<f64> = redactions.iter().map(|r| r.height_points).collect();
    heights.sort_by(f64::total_cmp);
    heights[heights.len() / 2] * 1.3
}

fn reaches_right_margin(r: &Redaction, page_width: f64, margin_threshold: f64) -> bool {
    page_width - r.bbox_points.x1 <= margin_threshold
}

fn starts_at_left_margin(r: &Redaction, margin_threshold: f64) -> bool {
    // Typical body-text left margin plus the configured slack.
    r.bbox_points.x0 <= 50.0 + margin_threshold
}

/// True when `next` sits on the line directly below `current`.
fn continues_on_next_line(
    current: &Redaction,
    next: &Redaction,
    line_height: f64,
    tolerance: f64,
) -> bool {
    let vertical_gap = next.bbox_points.y0 - current.bbox_points.y1;
    vertical_gap >= -tolerance && vertical_gap <= line_height * 2.0
}

fn short_group_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Detect and mark multi-line groups in a page's redactions.
///
/// Greedy: each bar that reaches the right margin seeks a successor starting
/// at the left margin on the following line; the chain continues while each
/// member itself reaches the right margin. Applying the pass twice is a
/// no-op: already-grouped members are regrouped identically (new ids,
/// same membership) and singletons stay untouched.
pub fn group_multiline(
    redactions: &mut [Redaction],
    page_width: f64,
    margin_threshold: f64,
    line_height_tolerance: f64,
) {
    if redactions.len() < 2 {
        return;
    }

    let line_height = estimate_line_height(redactions);

    // Indices sorted top-to-bottom, left-to-right.
    let mut order: Vec<usize> = (0..redactions.len()).collect();
    order.sort_by(|&a, &b| {
        redactions[a]
            .bbox_points
            .y0
            .total_cmp(&redactions[b].bbox_points.y0)
            .then_with(|| {
                redactions[a]
                    .bbox_points
                    .x0
                    .total_cmp(&redactions[b].bbox_points.x0)
            })
    });

    let mut used = vec![false; redactions.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (pos, &start) in order.iter().enumerate() {
        if used[start] {
            continue;
        }
        if !reaches_right_margin(&redactions[start], page_width, margin_threshold) {
            continue;
        }

        let mut members = vec![start];
        let mut current = start;

        for &candidate in &order[pos + 1..] {
            if used[candidate] {
                continue;
            }
            if !starts_at_left_margin(&redactions[candidate], margin_threshold) {
                continue;
            }
            if !continues_on_next_line(
                &redactions[current],
                &redactions[candidate],
                line_height,
                line_height_tolerance,
            ) {
                continue;
            }

            members.push(candidate);
            used[candidate] = true;

            if reaches_right_margin(&redactions[candidate], page_width, margin_threshold) {
                current = candidate;
            } else {
                break;
            }
        }

        if members.len() > 1 {
            used[start] = true;
            groups.push(members);
        }
    }

    for members in groups {
        let group_id = short_group_id();
        for (line_index, &idx) in members.iter().enumerate() {
            let r = &mut redactions[idx];
            r.is_multiline = true;
            r.multiline_group_id = Some(group_id.clone());
            r.line_index_in_group = Some(line_index as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelRect, PointRect, points_to_pixels};
    use crate::types::DetectionMethod;

    const PAGE_WIDTH: f64 = 595.0;

    fn redaction(bbox: PointRect) -> Redaction {
        Redaction::new(
            "doc",
            1,
            0,
            bbox,
            points_to_pixels(bbox, 150),
            DetectionMethod::Pixel,
            0.9,
        )
    }

    fn continuation_pair() -> Vec<Redaction> {
        vec![
            // Ends at the right margin (x1 = 545 of a 595pt page).
            redaction(PointRect::new(300.0, 300.0, 545.0, 312.0)),
            // Starts at the left margin on the next text line.
            redaction(PointRect::new(50.0, 315.0, 200.0, 327.0)),
        ]
    }

    #[test]
    fn margin_continuation_forms_a_group() {
        let mut redactions = continuation_pair();
        group_multiline(&mut redactions, PAGE_WIDTH, 50.0, 5.0);

        assert!(redactions.iter().all(|r| r.is_multiline));
        assert_eq!(
            redactions[0].multiline_group_id,
            redactions[1].multiline_group_id
        );
        assert!(redactions[0].multiline_group_id.is_some());
        assert_eq!(redactions[0].line_index_in_group, Some(0));
        assert_eq!(redactions[1].line_index_in_group, Some(1));
    }

    #[test]
    fn group_indices_are_contiguous_from_zero() {
        let mut redactions = vec![
            redaction(PointRect::new(300.0, 300.0, 545.0, 312.0)),
            redaction(PointRect::new(50.0, 315.0, 545.0, 327.0)),
            redaction(PointRect::new(50.0, 330.0, 250.0, 342.0)),
        ];
        group_multiline(&mut redactions, PAGE_WIDTH, 50.0, 5.0);

        let mut indices: Vec<u32> = redactions
            .iter()
            .filter_map(|r| r.line_index_in_group)
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn separated_bars_stay_standalone() {
        let mut redactions = vec![
            // Ends mid-line: no continuation sought.
            redaction(PointRect::new(100.0, 300.0, 300.0, 312.0)),
            redaction(PointRect::new(100.0, 400.0, 300.0, 412.0)),
        ];
        group_multiline(&mut redactions, PAGE_WIDTH, 50.0, 5.0);
        assert!(redactions.iter().all(|r| !r.is_multiline));
        assert!(redactions.iter().all(|r| r.multiline_group_id.is_none()));
    }

    #[test]
    fn too_large_vertical_gap_breaks_the_chain() {
        let mut redactions = vec![
            redaction(PointRect::new(300.0, 300.0, 545.0, 312.0)),
            // Several line heights below: unrelated bar.
            redaction(PointRect::new(50.0, 400.0, 200.0, 412.0)),
        ];
        group_multiline(&mut redactions, PAGE_WIDTH, 50.0, 5.0);
        assert!(redactions.iter().all(|r| !r.is_multiline));
    }

    #[test]
    fn grouping_twice_gives_the_same_membership() {
        let mut first = continuation_pair();
        group_multiline(&mut first, PAGE_WIDTH, 50.0, 5.0);
        let membership_once: Vec<(bool, Option<u32>)> = first
            .iter()
            .map(|r| (r.is_multiline, r.line_index_in_group))
            .collect();

        group_multiline(&mut first, PAGE_WIDTH, 50.0, 5.0);
        let membership_twice: Vec<(bool, Option<u32>)> = first
            .iter()
            .map(|r| (r.is_multiline, r.line_index_in_group))
            .collect();

        assert_eq!(membership_once, membership_twice);
    }

    #[test]
    fn single_redaction_is_never_grouped() {
        let mut redactions = vec![redaction(PointRect::new(300.0, 300.0, 545.0, 312.0))];
        group_multiline(&mut redactions, PAGE_WIDTH, 50.0, 5.0);
        assert!(!redactions[0].is_multiline);
    }
}
