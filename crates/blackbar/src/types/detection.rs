//! Raw and merged detection types.
//!
//! Detections live in a per-page arena: `MergedDetection` refers back to its
//! contributing raw detections by index rather than by owned copy, so
//! provenance can be traced without cyclic ownership.

use serde::{Deserialize, Serialize};

use crate::geometry::PointRect;

/// Which detector produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    /// PDF-structure evidence: annotations and drawing commands.
    PdfStructure,
    /// Rendered-pixel evidence: dark-bar analysis of the page raster.
    Pixel,
    /// Agreement of both detectors after merging.
    Both,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::PdfStructure => "pdf-structure",
            DetectionMethod::Pixel => "pixel",
            DetectionMethod::Both => "both",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate bar from a single detector. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Bounding box in PDF points, top-left origin.
    pub bbox: PointRect,
    pub method: DetectionMethod,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    /// Where the detection came from: an annotation subtype
    /// (`"redact"`, `"square"`, …) or a drawing source (`"drawing-rect"`).
    pub provenance: Option<String>,
}

impl RawDetection {
    pub fn new(bbox: PointRect, method: DetectionMethod, confidence: f64) -> Self {
        Self {
            bbox,
            method,
            confidence,
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, tag: impl Into<String>) -> Self {
        self.provenance = Some(tag.into());
        self
    }
}

/// The result of fusing per-page detections from both methods.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDetection {
    /// Union of the matched input boxes, in points.
    pub bbox: PointRect,
    pub method: DetectionMethod,
    pub confidence: f64,
    /// Index of the contributing structure detection in the page arena.
    pub structure_source: Option<usize>,
    /// Index of the contributing pixel detection in the page arena.
    pub pixel_source: Option<usize>,
}
