//! Page-level snapshot types.
//!
//! The reader flattens everything the pipeline needs from a PDF page into
//! plain structs: the rendered raster, text spans, per-character records,
//! annotations, and filled drawing paths. Every coordinate is already in PDF
//! points with a top-left origin; nothing downstream touches the PDF library.

use image::GrayImage;

use crate::geometry::PointRect;

/// A text span with position and font information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Bounding box in points, top-left origin.
    pub bbox: PointRect,
    /// Font size in points.
    pub font_size: f64,
    pub font_name: String,
    /// Span width divided by character count.
    pub char_width: f64,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, bbox: PointRect, font_size: f64, font_name: &str) -> Self {
        let text = text.into();
        let chars = text.chars().count().max(1);
        let char_width = bbox.width() / chars as f64;
        Self {
            text,
            bbox,
            font_size,
            font_name: font_name.to_string(),
            char_width,
        }
    }

    pub fn y_center(&self) -> f64 {
        (self.bbox.y0 + self.bbox.y1) / 2.0
    }
}

/// One character with its origin (baseline start) and bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextChar {
    pub ch: char,
    /// Baseline origin in points, top-left origin page space.
    pub origin: (f64, f64),
    pub bbox: PointRect,
    pub font_size: f64,
}

impl TextChar {
    pub fn y_center(&self) -> f64 {
        (self.bbox.y0 + self.bbox.y1) / 2.0
    }
}

/// Annotation subtypes the structure detector cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// An explicit redact annotation.
    Redaction,
    Square,
    Polygon,
    Highlight,
    Other,
}

/// A page annotation reduced to what detection needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub kind: AnnotationKind,
    pub bbox: PointRect,
    /// Luminance of the interior fill colour in `[0, 1]`, if any.
    pub fill_luminance: Option<f64>,
    /// Luminance of the stroke colour in `[0, 1]`, if any.
    pub stroke_luminance: Option<f64>,
    /// Human-readable subtype for provenance tagging.
    pub subtype: String,
}

/// A filled path object (drawing command) reduced to what detection needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledPath {
    pub bbox: PointRect,
    /// Luminance of the fill colour in `[0, 1]`.
    pub fill_luminance: f64,
}

/// Everything the per-page pipeline consumes, extracted in one reader pass.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// 1-indexed page number.
    pub page_num: u32,
    pub width_pt: f64,
    pub height_pt: f64,
    /// Grayscale raster at the run DPI.
    pub raster: GrayImage,
    pub spans: Vec<TextSpan>,
    pub chars: Vec<TextChar>,
    pub annotations: Vec<AnnotationRecord>,
    pub filled_paths: Vec<FilledPath>,
}

/// Relative luminance of an sRGB colour, components in `0..=255`.
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}
