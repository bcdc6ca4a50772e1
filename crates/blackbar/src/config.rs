//! Extraction and scoring configuration.
//!
//! The parameter structs are immutable once a run starts and are threaded
//! through every stage by reference. Unknown fields are rejected at parse
//! time; invalid values are rejected by [`ExtractionParams::validate`] before
//! any document is touched.

use serde::{Deserialize, Serialize};

use crate::error::{BlackbarError, Result};

/// Parameters for a redaction extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ExtractionParams {
    /// Pixel darkness cutoff (0-255). Rendered pixels below this value are
    /// treated as part of a redaction bar.
    pub threshold: u8,
    /// Minimum width/height ratio for a bar.
    pub min_aspect_ratio: f64,
    /// Minimum detection area in pixels².
    pub min_area: u32,
    /// Context-crop padding in pixels.
    pub border_padding: u32,
    /// Render resolution in dots per inch.
    pub dpi: u32,
    /// Characters of context kept before and after a redaction.
    pub context_chars: usize,
    /// IoU cutoff for merging detections and for non-maximum suppression.
    pub iou_threshold: f64,
    /// Distance from a page margin, in points, within which a bar counts as
    /// reaching that margin for multi-line grouping.
    pub margin_threshold: f64,
    /// Tolerance in points when matching vertical line spacing.
    pub line_height_tolerance: f64,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            min_aspect_ratio: 3.0,
            min_area: 500,
            border_padding: 50,
            dpi: 150,
            context_chars: 200,
            iou_threshold: 0.7,
            margin_threshold: 50.0,
            line_height_tolerance: 5.0,
        }
    }
}

impl ExtractionParams {
    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(BlackbarError::Config("dpi must be positive".into()));
        }
        if self.min_aspect_ratio <= 0.0 {
            return Err(BlackbarError::Config(
                "min_aspect_ratio must be positive".into(),
            ));
        }
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            return Err(BlackbarError::Config(
                "iou_threshold must be in (0, 1]".into(),
            ));
        }
        if self.margin_threshold < 0.0 || self.line_height_tolerance < 0.0 {
            return Err(BlackbarError::Config(
                "margin_threshold and line_height_tolerance must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Points-to-pixels scale factor for this run.
    pub fn scale(&self) -> f64 {
        self.dpi as f64 / 72.0
    }
}

/// Weights of the candidate-scoring signals.
///
/// The defaults reproduce the hand-tuned constants of the batch matcher;
/// exposing them lets a caller recalibrate empirically without a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScoreWeights {
    pub width_fit: f64,
    pub nlp: f64,
    pub leakage: f64,
    pub corpus_freq: f64,
    pub same_doc: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            width_fit: 0.35,
            nlp: 0.25,
            leakage: 0.15,
            corpus_freq: 0.10,
            same_doc: 0.15,
        }
    }
}

/// Parameters for the candidate-identification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IdentifyParams {
    /// Number of ranked candidates kept per redaction.
    pub top: usize,
    /// Redactions narrower than this (points) are skipped.
    pub min_width: f64,
    /// DPI of the high-resolution render used for leakage analysis.
    pub leak_dpi: u32,
    /// Scoring weights.
    pub weights: ScoreWeights,
}

impl Default for IdentifyParams {
    fn default() -> Self {
        Self {
            top: 20,
            min_width: 10.0,
            leak_dpi: 300,
            weights: ScoreWeights::default(),
        }
    }
}
