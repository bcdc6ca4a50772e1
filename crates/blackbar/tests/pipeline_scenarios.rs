//! End-to-end pipeline scenarios on synthetic one-page documents.
//!
//! Each scenario builds a `PageSnapshot` by hand (raster, spans, chars,
//! annotations) and runs the full per-page pipeline, so the behaviour under
//! test is deterministic and independent of any PDF library.

use image::{GrayImage, Luma};

use blackbar::config::ExtractionParams;
use blackbar::geometry::{PixelRect, PointRect, points_to_pixels};
use blackbar::output::{build_catalogue, build_summary};
use blackbar::pipeline::analyze_snapshot;
use blackbar::types::{
    AnnotationKind, AnnotationRecord, CorpusResult, DetectionMethod, DocumentResult, PageResult,
    PageSnapshot, TextSpan,
};

/// A blank A4-ish page (595x842 pt) rendered at 150 dpi.
fn blank_snapshot() -> PageSnapshot {
    PageSnapshot {
        page_num: 1,
        width_pt: 595.0,
        height_pt: 842.0,
        raster: GrayImage::from_pixel(1240, 1754, Luma([255])),
        spans: Vec::new(),
        chars: Vec::new(),
        annotations: Vec::new(),
        filled_paths: Vec::new(),
    }
}

fn paint(raster: &mut GrayImage, rect: PixelRect, value: u8) {
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            raster.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
}

fn paint_bar_pt(snapshot: &mut PageSnapshot, bar_pt: PointRect) -> PixelRect {
    let px = points_to_pixels(bar_pt, 150);
    paint(&mut snapshot.raster, px, 0);
    px
}

fn params() -> ExtractionParams {
    ExtractionParams::default()
}

/// Scenario: a single centred bar on an otherwise blank page.
#[test]
fn single_centred_bar_no_leakage() {
    let mut snapshot = blank_snapshot();
    paint_bar_pt(&mut snapshot, PointRect::new(100.0, 300.0, 200.0, 312.0));

    let redactions = analyze_snapshot(&snapshot, "scenario1", &params(), None).unwrap();
    assert_eq!(redactions.len(), 1);

    let r = &redactions[0];
    assert_eq!(r.detection_method, DetectionMethod::Pixel);
    assert_eq!(r.estimated_chars, 17); // round(100 / 6)
    assert!(!r.has_ascender_leakage);
    assert!(!r.has_descender_leakage);
    assert!(!r.is_multiline);
    assert!(r.width_points > 0.0 && r.height_points > 0.0);
}

/// Scenario: the same geometry is also present as a redact annotation; the
/// two detections agree and merge.
#[test]
fn agreement_merge_boosts_confidence() {
    let mut snapshot = blank_snapshot();
    let bar = PointRect::new(100.0, 300.0, 200.0, 312.0);
    paint_bar_pt(&mut snapshot, bar);
    snapshot.annotations.push(AnnotationRecord {
        kind: AnnotationKind::Redaction,
        bbox: bar,
        fill_luminance: Some(0.0),
        stroke_luminance: None,
        subtype: "redacted".into(),
    });

    let redactions = analyze_snapshot(&snapshot, "scenario2", &params(), None).unwrap();
    assert_eq!(redactions.len(), 1);

    let r = &redactions[0];
    assert_eq!(r.detection_method, DetectionMethod::Both);
    assert!(r.confidence >= 0.95);
    // The merged box is the union of the two inputs.
    assert!(r.bbox_points.x0 <= bar.x0 && r.bbox_points.x1 >= bar.x1);
}

/// Scenario: ascender stubs peek into the top band; the flag and the pixel
/// count both fire, and the bottom stays clean.
#[test]
fn ascender_leakage_is_detected() {
    let mut snapshot = blank_snapshot();
    let bar = PointRect::new(100.0, 300.0, 200.0, 312.0);
    let bar_px = paint_bar_pt(&mut snapshot, bar);

    // Text on the same line so the leakage bands scale from a real font
    // size (12 pt) instead of the fallback.
    snapshot.spans.push(TextSpan::new(
        "before",
        PointRect::new(40.0, 300.0, 95.0, 312.0),
        12.0,
        "Times-Roman",
    ));

    // Two "l" stems poking 3 px above the bar through the aa inset.
    for x0 in [bar_px.x0 + 40, bar_px.x0 + 80] {
        paint(
            &mut snapshot.raster,
            PixelRect::new(x0, bar_px.y0 - 8, x0 + 2, bar_px.y0),
            0,
        );
    }

    let redactions = analyze_snapshot(&snapshot, "scenario3", &params(), None).unwrap();
    let r = &redactions[0];
    assert!(r.has_ascender_leakage);
    assert!(r.leakage_pixels_top >= 1);
    assert!(!r.has_descender_leakage);
    assert_eq!(r.leakage_pixels_bottom, 0);
}

/// Scenario: a bar runs to the right margin and continues from the left
/// margin on the next line.
#[test]
fn multiline_continuation_is_grouped() {
    let mut snapshot = blank_snapshot();
    paint_bar_pt(&mut snapshot, PointRect::new(300.0, 300.0, 545.0, 312.0));
    paint_bar_pt(&mut snapshot, PointRect::new(50.0, 315.0, 200.0, 327.0));

    let redactions = analyze_snapshot(&snapshot, "scenario4", &params(), None).unwrap();
    assert_eq!(redactions.len(), 2);
    assert!(redactions.iter().all(|r| r.is_multiline));
    assert_eq!(
        redactions[0].multiline_group_id,
        redactions[1].multiline_group_id
    );
    assert_eq!(redactions[0].line_index_in_group, Some(0));
    assert_eq!(redactions[1].line_index_in_group, Some(1));
}

/// Applying the page pipeline twice to identical input produces identical
/// structure (modulo the random group ids).
#[test]
fn page_analysis_is_deterministic() {
    let build = || {
        let mut snapshot = blank_snapshot();
        paint_bar_pt(&mut snapshot, PointRect::new(100.0, 300.0, 200.0, 312.0));
        paint_bar_pt(&mut snapshot, PointRect::new(100.0, 400.0, 250.0, 412.0));
        analyze_snapshot(&snapshot, "doc", &params(), None).unwrap()
    };
    let a = build();
    let b = build();
    assert_eq!(a, b);
}

/// A full corpus result serialises into a structurally stable catalogue and
/// summary.
#[test]
fn catalogue_and_summary_are_stable_for_fixed_timestamp() {
    let mut snapshot = blank_snapshot();
    paint_bar_pt(&mut snapshot, PointRect::new(100.0, 300.0, 200.0, 312.0));
    let redactions = analyze_snapshot(&snapshot, "doc-1", &params(), None).unwrap();

    let corpus = CorpusResult {
        documents: vec![DocumentResult {
            doc_id: "doc-1".into(),
            file_path: "in/doc-1.pdf".into(),
            total_pages: 1,
            pages: vec![PageResult::ok(1, redactions)],
            error: None,
        }],
        partial: false,
    };

    let params = params();
    let a = serde_json::to_string(&build_catalogue(&corpus, &params, "2026-01-01T00:00:00")).unwrap();
    let b = serde_json::to_string(&build_catalogue(&corpus, &params, "2026-01-01T00:00:00")).unwrap();
    assert_eq!(a, b);

    let summary = build_summary(&corpus, &params, "2026-01-01T00:00:00");
    assert_eq!(summary.corpus_stats.total_redactions, 1);
    assert_eq!(summary.detection_method_breakdown.pixel_only, 1);
    assert_eq!(summary.multiline_stats.total_multiline_redactions, 0);
}

/// NMS invariant over a crowded page: no two surviving detections overlap
/// above the threshold.
#[test]
fn crowded_page_has_no_overlapping_survivors() {
    let mut snapshot = blank_snapshot();
    let bars = [
        PointRect::new(60.0, 100.0, 260.0, 112.0),
        PointRect::new(60.0, 160.0, 300.0, 172.0),
        PointRect::new(320.0, 160.0, 520.0, 172.0),
        PointRect::new(60.0, 700.0, 400.0, 714.0),
    ];
    for bar in bars {
        paint_bar_pt(&mut snapshot, bar);
        // The same boxes as structure annotations, slightly offset, to
        // force merge and suppression work.
        snapshot.annotations.push(AnnotationRecord {
            kind: AnnotationKind::Square,
            bbox: PointRect::new(bar.x0 - 0.5, bar.y0 - 0.5, bar.x1 + 0.5, bar.y1 + 0.5),
            fill_luminance: Some(0.05),
            stroke_luminance: None,
            subtype: "square".into(),
        });
    }

    let p = params();
    let redactions = analyze_snapshot(&snapshot, "doc", &p, None).unwrap();
    assert_eq!(redactions.len(), bars.len());
    for i in 0..redactions.len() {
        for j in (i + 1)..redactions.len() {
            let overlap = blackbar::geometry::iou(
                redactions[i].bbox_points,
                redactions[j].bbox_points,
            );
            assert!(overlap <= p.iou_threshold);
        }
    }
    // All merged: every bar was seen by both detectors.
    assert!(
        redactions
            .iter()
            .all(|r| r.detection_method == DetectionMethod::Both)
    );
}
