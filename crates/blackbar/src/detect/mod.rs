//! Dual-method redaction detection.
//!
//! Two independent detectors produce [`crate::types::RawDetection`]s per
//! page: [`structure`] walks annotations and drawing commands, [`pixel`]
//! analyses the rendered raster. [`merge`] fuses the two sets by IoU and
//! applies non-maximum suppression.

pub mod merge;
pub mod pixel;
pub mod structure;

pub use merge::{merge_detections, non_max_suppression};
pub use pixel::detect_pixel_redactions;
pub use structure::detect_structure_redactions;
