//! Fusing structure and pixel detections.
//!
//! For each structure detection, the pixel detection with the highest IoU at
//! or above the cutoff is paired with it; agreement boosts confidence and
//! the merged box is the union of the pair. Unmatched detections from either
//! side survive unchanged. A final greedy non-maximum suppression pass
//! removes residual overlaps.

use crate::geometry::{iou, union_bbox};
use crate::types::{DetectionMethod, MergedDetection, RawDetection};

/// Index and IoU of the best candidate above `iou_threshold`, if any.
fn best_match(
    detection: &RawDetection,
    candidates: &[RawDetection],
    used: &[bool],
    iou_threshold: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if used[i] {
            continue;
        }
        let overlap = iou(detection.bbox, candidate.bbox);
        if overlap >= iou_threshold && best.is_none_or(|(_, b)| overlap > b) {
            best = Some((i, overlap));
        }
    }
    best
}

/// Cross-reference detections from both methods and suppress duplicates.
///
/// The returned list is sorted by confidence, highest first, and contains no
/// two detections whose IoU exceeds `iou_threshold`. Source indices refer
/// into the input slices.
pub fn merge_detections(
    structure: &[RawDetection],
    pixel: &[RawDetection],
    iou_threshold: f64,
) -> Vec<MergedDetection> {
    let mut merged = Vec::with_capacity(structure.len() + pixel.len());
    let mut pixel_used = vec![false; pixel.len()];

    for (si, sdet) in structure.iter().enumerate() {
        match best_match(sdet, pixel, &pixel_used, iou_threshold) {
            Some((pi, overlap)) => {
                pixel_used[pi] = true;
                let pdet = &pixel[pi];
                let confidence =
                    ((sdet.confidence + pdet.confidence) / 2.0 + 0.1 * overlap).min(1.0);
                merged.push(MergedDetection {
                    bbox: union_bbox(sdet.bbox, pdet.bbox),
                    method: DetectionMethod::Both,
                    confidence,
                    structure_source: Some(si),
                    pixel_source: Some(pi),
                });
            }
            None => merged.push(MergedDetection {
                bbox: sdet.bbox,
                method: DetectionMethod::PdfStructure,
                confidence: sdet.confidence,
                structure_source: Some(si),
                pixel_source: None,
            }),
        }
    }

    for (pi, pdet) in pixel.iter().enumerate() {
        if !pixel_used[pi] {
            merged.push(MergedDetection {
                bbox: pdet.bbox,
                method: DetectionMethod::Pixel,
                confidence: pdet.confidence,
                structure_source: None,
                pixel_source: Some(pi),
            });
        }
    }

    non_max_suppression(merged, iou_threshold)
}

/// Greedy non-maximum suppression: keep each detection, best first, unless
/// it overlaps an already-kept one above `iou_threshold`.
pub fn non_max_suppression(
    mut detections: Vec<MergedDetection>,
    iou_threshold: f64,
) -> Vec<MergedDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<MergedDetection> = Vec::with_capacity(detections.len());
    for det in detections {
        if kept.iter().all(|k| iou(det.bbox, k.bbox) <= iou_threshold) {
            kept.push(det);
        }
    }
    kept
}
