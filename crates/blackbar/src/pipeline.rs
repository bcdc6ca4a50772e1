//! Per-page and per-document analysis pipeline.
//!
//! Composes the leaf stages over one [`PageSnapshot`]: dual detection,
//! merge and suppression, context, leakage, crops, reading-order indexing,
//! and multi-line grouping. Page failures are recorded in the page's result
//! row; document failures in the document's. Nothing here aborts a run.

use std::path::Path;

use crate::config::ExtractionParams;
use crate::context::analyze_context;
use crate::crop::save_crops;
use crate::detect::{detect_pixel_redactions, detect_structure_redactions, merge_detections};
use crate::error::Result;
use crate::geometry::points_to_pixels;
use crate::leakage::analyze_leakage;
use crate::multiline::group_multiline;
use crate::reader;
use crate::types::{DocumentResult, PageResult, PageSnapshot, Redaction};

/// Assumed font size, in points, when no text sits near a redaction.
const FALLBACK_FONT_SIZE_PT: f64 = 10.0;

/// Analyse one page snapshot into fully populated redaction records.
pub fn analyze_snapshot(
    snapshot: &PageSnapshot,
    doc_id: &str,
    params: &ExtractionParams,
    image_dir: Option<&Path>,
) -> Result<Vec<Redaction>> {
    let structure = detect_structure_redactions(
        &snapshot.annotations,
        &snapshot.filled_paths,
        params.min_aspect_ratio,
    );
    let pixel = detect_pixel_redactions(
        &snapshot.raster,
        params.dpi,
        params.threshold,
        params.min_aspect_ratio,
        params.min_area,
    );
    let merged = merge_detections(&structure, &pixel, params.iou_threshold);

    let mut redactions = Vec::with_capacity(merged.len());
    for detection in &merged {
        // Degenerate annotation boxes (zero extent) carry nothing to
        // analyse and would violate the catalogue's size invariant.
        if !detection.bbox.is_valid() {
            continue;
        }
        let bbox_pixels = points_to_pixels(detection.bbox, params.dpi);
        let mut redaction = Redaction::new(
            doc_id,
            snapshot.page_num,
            0, // re-indexed below, after reading-order sort
            detection.bbox,
            bbox_pixels,
            detection.method,
            detection.confidence,
        );

        let context = analyze_context(&snapshot.spans, &detection.bbox, params.context_chars);
        redaction.estimated_chars = context.estimated_chars;
        redaction.font_size_nearby = context.font_size_nearby;
        redaction.avg_char_width = context.avg_char_width;
        redaction.text_before = context.text_before;
        redaction.text_after = context.text_after;

        let font_size_px =
            context.font_size_nearby.unwrap_or(FALLBACK_FONT_SIZE_PT) * params.scale();
        let leakage = analyze_leakage(&snapshot.raster, bbox_pixels, font_size_px, params.dpi);
        redaction.has_ascender_leakage = leakage.has_ascender_leakage();
        redaction.has_descender_leakage = leakage.has_descender_leakage();
        redaction.leakage_pixels_top = leakage.pixels_top();
        redaction.leakage_pixels_bottom = leakage.pixels_bottom();

        redactions.push(redaction);
    }

    // Detections arrive confidence-first from NMS; the catalogue indexes
    // them in reading order.
    redactions.sort_by(|a, b| {
        a.bbox_points
            .y0
            .total_cmp(&b.bbox_points.y0)
            .then_with(|| a.bbox_points.x0.total_cmp(&b.bbox_points.x0))
    });
    for (index, redaction) in redactions.iter_mut().enumerate() {
        redaction.redaction_index = index as u32;
    }

    if let Some(output_dir) = image_dir {
        for redaction in &mut redactions {
            let (tight, context) = save_crops(
                &snapshot.raster,
                redaction.bbox_pixels,
                doc_id,
                snapshot.page_num,
                redaction.redaction_index,
                output_dir,
                params.border_padding,
            )?;
            redaction.image_tight = tight;
            redaction.image_context = context;
        }
    }

    group_multiline(
        &mut redactions,
        snapshot.width_pt,
        params.margin_threshold,
        params.line_height_tolerance,
    );

    Ok(redactions)
}

/// Analyse a snapshot into a [`PageResult`], recording any failure.
pub fn process_page(
    snapshot: &PageSnapshot,
    doc_id: &str,
    params: &ExtractionParams,
    image_dir: Option<&Path>,
) -> PageResult {
    match analyze_snapshot(snapshot, doc_id, params, image_dir) {
        Ok(redactions) => PageResult::ok(snapshot.page_num, redactions),
        Err(err) => {
            tracing::warn!(doc_id, page = snapshot.page_num, %err, "page analysis failed");
            PageResult::failed(snapshot.page_num, err.to_string())
        }
    }
}

/// Derive a document id from its file name.
pub fn doc_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

/// Process one PDF document, page by page, in page order.
///
/// A page that fails to read or analyse becomes an errored [`PageResult`];
/// a document that cannot be opened becomes an errored [`DocumentResult`].
pub fn process_document(
    path: &Path,
    params: &ExtractionParams,
    image_dir: Option<&Path>,
) -> DocumentResult {
    let doc_id = doc_id_for(path);
    let file_path = path.to_string_lossy().to_string();

    let total_pages = match reader::document_page_count(path) {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(%doc_id, %err, "cannot open document");
            return DocumentResult::failed(&doc_id, &file_path, err.to_string());
        }
    };

    let mut pages = Vec::with_capacity(total_pages as usize);
    for page_index in 0..total_pages {
        match reader::page_snapshot(path, page_index, params.dpi) {
            Ok(snapshot) => {
                pages.push(process_page(&snapshot, &doc_id, params, image_dir));
            }
            Err(err) => {
                tracing::warn!(%doc_id, page = page_index + 1, %err, "page read failed");
                pages.push(PageResult::failed(page_index + 1, err.to_string()));
            }
        }
    }

    DocumentResult {
        doc_id,
        file_path,
        total_pages,
        pages,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelRect, PointRect};
    use crate::types::{AnnotationKind, AnnotationRecord, DetectionMethod, TextSpan};
    use image::{GrayImage, Luma};

    /// US-Letter-ish page at 150 dpi with a white raster.
    pub(crate) fn blank_snapshot() -> PageSnapshot {
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

    pub(crate) fn paint_bar(snapshot: &mut PageSnapshot, bar_px: PixelRect) {
        for y in bar_px.y0..bar_px.y1 {
            for x in bar_px.x0..bar_px.x1 {
                snapshot.raster.put_pixel(x as u32, y as u32, Luma([0]));
            }
        }
    }

    fn params() -> ExtractionParams {
        ExtractionParams::default()
    }

    #[test]
    fn centred_bar_yields_one_pixel_detection() {
        let mut snapshot = blank_snapshot();
        // (100, 300)-(200, 312) pt at 150 dpi.
        paint_bar(&mut snapshot, PixelRect::new(208, 625, 417, 650));

        let redactions = analyze_snapshot(&snapshot, "doc", &params(), None).unwrap();
        assert_eq!(redactions.len(), 1);
        let r = &redactions[0];
        assert_eq!(r.detection_method, DetectionMethod::Pixel);
        assert_eq!(r.redaction_index, 0);
        assert!(!r.has_ascender_leakage);
        assert!(!r.has_descender_leakage);
        assert!(!r.is_multiline);
        // ~100pt wide, no nearby text: width / 6 ≈ 17 characters.
        assert!((16..=18).contains(&r.estimated_chars));
    }

    #[test]
    fn annotation_and_pixels_merge_to_both() {
        let mut snapshot = blank_snapshot();
        paint_bar(&mut snapshot, PixelRect::new(208, 625, 417, 650));
        snapshot.annotations.push(AnnotationRecord {
            kind: AnnotationKind::Redaction,
            bbox: PointRect::new(100.0, 300.0, 200.0, 312.0),
            fill_luminance: Some(0.0),
            stroke_luminance: None,
            subtype: "redacted".into(),
        });

        let redactions = analyze_snapshot(&snapshot, "doc", &params(), None).unwrap();
        assert_eq!(redactions.len(), 1);
        assert_eq!(redactions[0].detection_method, DetectionMethod::Both);
        assert!(redactions[0].confidence >= 0.95);
    }

    #[test]
    fn indices_are_dense_in_reading_order() {
        let mut snapshot = blank_snapshot();
        // Painted out of reading order on purpose.
        paint_bar(&mut snapshot, PixelRect::new(600, 900, 900, 925));
        paint_bar(&mut snapshot, PixelRect::new(100, 400, 400, 425));
        paint_bar(&mut snapshot, PixelRect::new(700, 400, 1000, 425));

        let redactions = analyze_snapshot(&snapshot, "doc", &params(), None).unwrap();
        assert_eq!(redactions.len(), 3);
        let indices: Vec<u32> = redactions.iter().map(|r| r.redaction_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        // Reading order: top row left, top row right, lower row.
        assert!(redactions[0].bbox_points.x0 < redactions[1].bbox_points.x0);
        assert!(redactions[1].bbox_points.y0 < redactions[2].bbox_points.y0);
    }

    #[test]
    fn crops_are_written_when_image_dir_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut snapshot = blank_snapshot();
        paint_bar(&mut snapshot, PixelRect::new(208, 625, 417, 650));

        let redactions =
            analyze_snapshot(&snapshot, "doc", &params(), Some(dir.path())).unwrap();
        let r = &redactions[0];
        assert_eq!(r.image_tight.as_deref(), Some("images/doc_p1_r0_tight.png"));
        assert!(dir.path().join("images/doc_p1_r0_tight.png").is_file());
        assert!(dir.path().join("images/doc_p1_r0_context.png").is_file());
    }

    #[test]
    fn context_fields_come_from_surrounding_spans() {
        let mut snapshot = blank_snapshot();
        paint_bar(&mut snapshot, PixelRect::new(208, 625, 417, 650));
        snapshot.spans.push(TextSpan::new(
            "Mr.",
            PointRect::new(70.0, 300.0, 95.0, 312.0),
            12.0,
            "Times-Roman",
        ));
        snapshot.spans.push(TextSpan::new(
            "testified",
            PointRect::new(210.0, 300.0, 260.0, 312.0),
            12.0,
            "Times-Roman",
        ));

        let redactions = analyze_snapshot(&snapshot, "doc", &params(), None).unwrap();
        let r = &redactions[0];
        assert_eq!(r.text_before, "Mr.");
        assert_eq!(r.text_after, "testified");
        assert_eq!(r.font_size_nearby, Some(12.0));
    }

    #[test]
    fn width_pixels_invariant_holds() {
        let mut snapshot = blank_snapshot();
        paint_bar(&mut snapshot, PixelRect::new(208, 625, 417, 650));
        let redactions = analyze_snapshot(&snapshot, "doc", &params(), None).unwrap();
        for r in &redactions {
            let expected = (r.width_points * 150.0 / 72.0).round() as i32;
            assert!((r.width_pixels - expected).abs() <= 1);
        }
    }
}
