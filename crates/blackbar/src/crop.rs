//! Redaction crop images.
//!
//! Two crops per redaction: a tight crop of the exact bar, and a context
//! crop dilated by the configured padding, both clamped to the page.
//! Filenames are deterministic and collision-free across a run.

use std::path::Path;

use image::GrayImage;

use crate::error::{BlackbarError, Result};
use crate::geometry::PixelRect;

/// Crop a region from the page raster, expanded by `padding` pixels and
/// clamped to the image. Returns `None` when nothing remains.
pub fn crop_region(raster: &GrayImage, bbox: PixelRect, padding: u32) -> Option<GrayImage> {
    let padded = PixelRect::new(
        bbox.x0 - padding as i32,
        bbox.y0 - padding as i32,
        bbox.x1 + padding as i32,
        bbox.y1 + padding as i32,
    );
    let clamped = padded.clamped(raster.width(), raster.height())?;

    Some(
        image::imageops::crop_imm(
            raster,
            clamped.x0 as u32,
            clamped.y0 as u32,
            clamped.width() as u32,
            clamped.height() as u32,
        )
        .to_image(),
    )
}

/// Sanitise a document id for use in a filename: anything outside
/// `[A-Za-z0-9._-]` becomes an underscore.
pub fn sanitize_doc_id(doc_id: &str) -> String {
    doc_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Deterministic crop filename: `{doc}_p{page}_r{index}_{kind}.png`.
pub fn crop_filename(doc_id: &str, page_num: u32, redaction_index: u32, kind: &str) -> String {
    format!(
        "{}_p{}_r{}_{}.png",
        sanitize_doc_id(doc_id),
        page_num,
        redaction_index,
        kind
    )
}

/// Extract and save both crops, returning their paths relative to the
/// output directory. A crop that ends up empty yields `None` for its slot.
pub fn save_crops(
    raster: &GrayImage,
    bbox: PixelRect,
    doc_id: &str,
    page_num: u32,
    redaction_index: u32,
    output_dir: &Path,
    border_padding: u32,
) -> Result<(Option<String>, Option<String>)> {
    let images_dir = output_dir.join("images");
    std::fs::create_dir_all(&images_dir).map_err(|e| BlackbarError::io(&images_dir, e))?;

    let mut save = |crop: Option<GrayImage>, kind: &str| -> Result<Option<String>> {
        let Some(crop) = crop else { return Ok(None) };
        if crop.width() == 0 || crop.height() == 0 {
            return Ok(None);
        }
        let filename = crop_filename(doc_id, page_num, redaction_index, kind);
        crop.save(images_dir.join(&filename))?;
        Ok(Some(format!("images/{filename}")))
    };

    let tight = save(crop_region(raster, bbox, 0), "tight")?;
    let context = save(crop_region(raster, bbox, border_padding), "context")?;
    Ok((tight, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn raster() -> GrayImage {
        GrayImage::from_pixel(300, 200, Luma([255]))
    }

    #[test]
    fn tight_crop_matches_the_bbox() {
        let crop = crop_region(&raster(), PixelRect::new(10, 20, 110, 45), 0).unwrap();
        assert_eq!((crop.width(), crop.height()), (100, 25));
    }

    #[test]
    fn context_crop_is_clamped_to_the_page() {
        let crop = crop_region(&raster(), PixelRect::new(10, 20, 110, 45), 50).unwrap();
        // Left/top hit the page edge, right/bottom get the full padding.
        assert_eq!((crop.width(), crop.height()), (160, 95));
    }

    #[test]
    fn fully_outside_bbox_yields_none() {
        assert!(crop_region(&raster(), PixelRect::new(400, 400, 500, 420), 0).is_none());
    }

    #[test]
    fn doc_ids_are_sanitised_for_filenames() {
        assert_eq!(
            crop_filename("case 7/a:b", 3, 2, "tight"),
            "case_7_a_b_p3_r2_tight.png"
        );
    }

    #[test]
    fn both_crops_are_written_and_paths_are_relative() {
        let dir = tempfile::tempdir().unwrap();
        let (tight, context) = save_crops(
            &raster(),
            PixelRect::new(10, 20, 110, 45),
            "doc-1",
            1,
            0,
            dir.path(),
            50,
        )
        .unwrap();
        assert_eq!(tight.as_deref(), Some("images/doc-1_p1_r0_tight.png"));
        assert_eq!(context.as_deref(), Some("images/doc-1_p1_r0_context.png"));
        assert!(dir.path().join("images/doc-1_p1_r0_tight.png").is_file());
        assert!(dir.path().join("images/doc-1_p1_r0_context.png").is_file());
    }
}
