//! The fully analysed redaction record persisted to the catalogue.

use serde::{Deserialize, Serialize};

use crate::geometry::{PixelRect, PointRect};
use crate::types::DetectionMethod;

/// A fully processed redaction with all per-page analysis complete.
///
/// Field names and order match the catalogue schema; the CSV writer flattens
/// the two bounding boxes into per-coordinate columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redaction {
    // Identification
    pub doc_id: String,
    /// 1-indexed page number.
    pub page_num: u32,
    /// Dense, 0-indexed position on the page in reading order.
    pub redaction_index: u32,

    // Geometry in PDF points
    pub bbox_points: PointRect,
    pub width_points: f64,
    pub height_points: f64,

    // Geometry in pixels at the render DPI
    pub bbox_pixels: PixelRect,
    pub width_pixels: i32,
    pub height_pixels: i32,

    // Detection metadata
    pub detection_method: DetectionMethod,
    pub confidence: f64,

    // Character estimation
    pub estimated_chars: u32,
    pub font_size_nearby: Option<f64>,
    pub avg_char_width: Option<f64>,

    // Context
    pub text_before: String,
    pub text_after: String,

    // Leakage analysis
    pub has_ascender_leakage: bool,
    pub has_descender_leakage: bool,
    pub leakage_pixels_top: u32,
    pub leakage_pixels_bottom: u32,

    // Multi-line grouping
    pub is_multiline: bool,
    pub multiline_group_id: Option<String>,
    pub line_index_in_group: Option<u32>,

    // Crop paths, relative to the output directory
    pub image_tight: Option<String>,
    pub image_context: Option<String>,
}

impl Redaction {
    /// Build a record from its geometric core; analysis fields start empty.
    pub fn new(
        doc_id: &str,
        page_num: u32,
        redaction_index: u32,
        bbox_points: PointRect,
        bbox_pixels: PixelRect,
        method: DetectionMethod,
        confidence: f64,
    ) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            page_num,
            redaction_index,
            bbox_points,
            width_points: bbox_points.width(),
            height_points: bbox_points.height(),
            bbox_pixels,
            width_pixels: bbox_pixels.width(),
            height_pixels: bbox_pixels.height(),
            detection_method: method,
            confidence,
            estimated_chars: 0,
            font_size_nearby: None,
            avg_char_width: None,
            text_before: String::new(),
            text_after: String::new(),
            has_ascender_leakage: false,
            has_descender_leakage: false,
            leakage_pixels_top: 0,
            leakage_pixels_bottom: 0,
            is_multiline: false,
            multiline_group_id: None,
            line_index_in_group: None,
            image_tight: None,
            image_context: None,
        }
    }
}
