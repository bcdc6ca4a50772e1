//! PDF-structure redaction detection.
//!
//! Walks the page's annotations and filled drawing commands:
//! - redact annotations are accepted unconditionally (confidence 1.0);
//! - square/polygon annotations with a dark fill (confidence 0.9);
//! - dark-stroked highlight annotations, an unusual but real pattern
//!   (confidence 0.7);
//! - filled rectangles from drawing commands with a dark fill and a
//!   bar-like shape (confidence 0.85).
//!
//! Text-span colour is never used as evidence: black text is
//! indistinguishable from black-on-black hidden text in the structure data,
//! and treating it as a redaction flags every word on the page.

use crate::types::{AnnotationKind, AnnotationRecord, DetectionMethod, FilledPath, RawDetection};

/// Fill/stroke colours below this luminance count as dark.
pub const DARK_COLOR_THRESHOLD: f64 = 0.15;

/// Minimum drawing-rect width in points.
const MIN_DRAWING_WIDTH: f64 = 10.0;
/// Minimum drawing-rect height in points.
const MIN_DRAWING_HEIGHT: f64 = 3.0;

fn is_dark(luminance: Option<f64>) -> bool {
    luminance.is_some_and(|l| l < DARK_COLOR_THRESHOLD)
}

/// Extract redaction candidates from a page's annotations.
fn detect_from_annotations(annotations: &[AnnotationRecord]) -> Vec<RawDetection> {
    let mut detections = Vec::new();

    for annot in annotations {
        match annot.kind {
            AnnotationKind::Redaction => {
                detections.push(
                    RawDetection::new(annot.bbox, DetectionMethod::PdfStructure, 1.0)
                        .with_provenance("redact"),
                );
            }
            AnnotationKind::Square | AnnotationKind::Polygon => {
                if is_dark(annot.fill_luminance) {
                    detections.push(
                        RawDetection::new(annot.bbox, DetectionMethod::PdfStructure, 0.9)
                            .with_provenance(annot.subtype.clone()),
                    );
                }
            }
            AnnotationKind::Highlight => {
                if is_dark(annot.stroke_luminance) {
                    detections.push(
                        RawDetection::new(annot.bbox, DetectionMethod::PdfStructure, 0.7)
                            .with_provenance("highlight-dark"),
                    );
                }
            }
            AnnotationKind::Other => {}
        }
    }

    detections
}

/// Extract redaction candidates from filled drawing commands.
fn detect_from_drawings(paths: &[FilledPath], min_aspect_ratio: f64) -> Vec<RawDetection> {
    let mut detections = Vec::new();

    for path in paths {
        if path.fill_luminance >= DARK_COLOR_THRESHOLD {
            continue;
        }
        let width = path.bbox.width();
        let height = path.bbox.height();
        if width < MIN_DRAWING_WIDTH || height < MIN_DRAWING_HEIGHT {
            continue;
        }
        if path.bbox.aspect_ratio() < min_aspect_ratio {
            continue;
        }
        detections.push(
            RawDetection::new(path.bbox, DetectionMethod::PdfStructure, 0.85)
                .with_provenance("drawing-rect"),
        );
    }

    detections
}

/// All redaction candidates a page's structure yields.
pub fn detect_structure_redactions(
    annotations: &[AnnotationRecord],
    filled_paths: &[FilledPath],
    min_aspect_ratio: f64,
) -> Vec<RawDetection> {
    let mut detections = detect_from_annotations(annotations);
    detections.extend(detect_from_drawings(filled_paths, min_aspect_ratio));
    detections
}
