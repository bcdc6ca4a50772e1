//! Pixel-level redaction detection on the rendered page raster.
//!
//! Pipeline: threshold the grayscale raster into a dark-pixel mask, clean it
//! with a morphological close-then-open (3×3 kernel), label connected
//! components, and keep the components that look like solid bars.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::geometry::{PixelRect, pixels_to_points};
use crate::types::{DetectionMethod, RawDetection};

/// A bar must fill at least this fraction of its bounding box.
const MIN_FILL_RATIO: f64 = 0.7;

/// Binary mask of dark pixels: values `< threshold` become 255.
pub fn dark_pixel_mask(raster: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = GrayImage::new(raster.width(), raster.height());
    for (src, dst) in raster.pixels().zip(mask.pixels_mut()) {
        *dst = Luma([if src.0[0] < threshold { 255 } else { 0 }]);
    }
    // Close fills pinholes inside bars; open removes isolated speckles.
    let mask = close(&mask, Norm::LInf, 1);
    open(&mask, Norm::LInf, 1)
}

/// One labelled component with its bounding box and pixel count.
#[derive(Debug, Clone, Copy)]
struct Component {
    bbox: PixelRect,
    pixels: u64,
}

fn label_components(mask: &GrayImage) -> Vec<Component> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut by_label: Vec<Option<Component>> = Vec::new();

    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel.0[0] as usize;
        if label == 0 {
            continue;
        }
        if by_label.len() <= label {
            by_label.resize(label + 1, None);
        }
        let (x, y) = (x as i32, y as i32);
        match &mut by_label[label] {
            Some(c) => {
                c.bbox.x0 = c.bbox.x0.min(x);
                c.bbox.y0 = c.bbox.y0.min(y);
                c.bbox.x1 = c.bbox.x1.max(x + 1);
                c.bbox.y1 = c.bbox.y1.max(y + 1);
                c.pixels += 1;
            }
            slot @ None => {
                *slot = Some(Component {
                    bbox: PixelRect::new(x, y, x + 1, y + 1),
                    pixels: 1,
                });
            }
        }
    }

    by_label.into_iter().flatten().collect()
}

/// Detect redaction bars in a rendered page.
///
/// Returned detections carry their boxes in PDF points at `dpi` and a
/// confidence that grows with the bar's aspect ratio, capped at 0.95.
pub fn detect_pixel_redactions(
    raster: &GrayImage,
    dpi: u32,
    threshold: u8,
    min_aspect_ratio: f64,
    min_area: u32,
) -> Vec<RawDetection> {
    let mask = dark_pixel_mask(raster, threshold);
    let mut detections = Vec::new();

    for component in label_components(&mask) {
        let width = component.bbox.width() as f64;
        let height = component.bbox.height() as f64;
        let bbox_area = width * height;

        if bbox_area < min_area as f64 {
            continue;
        }
        if height <= 0.0 {
            continue;
        }
        let aspect = width / height;
        if aspect < min_aspect_ratio {
            continue;
        }
        // Bars are solid rectangles, not sparse shapes.
        if (component.pixels as f64) / bbox_area < MIN_FILL_RATIO {
            continue;
        }

        let confidence = (0.7 + aspect / 20.0).min(0.95);
        detections.push(RawDetection::new(
            pixels_to_points(component.bbox, dpi),
            DetectionMethod::Pixel,
            confidence,
        ));
    }

    detections
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A white page with a black rectangle drawn on it.
    pub(crate) fn page_with_bar(
        width: u32,
        height: u32,
        bar: PixelRect,
    ) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        for y in bar.y0..bar.y1 {
            for x in bar.x0..bar.x1 {
                img.put_pixel(x as u32, y as u32, Luma([0]));
            }
        }
        img
    }

    #[test]
    fn finds_a_single_bar() {
        let bar = PixelRect::new(208, 625, 417, 650);
        let img = page_with_bar(1240, 1754, bar);
        let out = detect_pixel_redactions(&img, 150, 30, 3.0, 500);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].method, DetectionMethod::Pixel);
        // 209x25 px => aspect 8.36 => confidence 0.7 + 0.418
        assert!(out[0].confidence > 0.9);
        let bbox = out[0].bbox;
        assert!((bbox.x0 - 208.0 * 72.0 / 150.0).abs() < 1.0);
        assert!((bbox.width() - 209.0 * 72.0 / 150.0).abs() < 1.5);
    }

    #[test]
    fn blank_page_yields_nothing() {
        let img = GrayImage::from_pixel(600, 800, Luma([255]));
        assert!(detect_pixel_redactions(&img, 150, 30, 3.0, 500).is_empty());
    }

    #[test]
    fn squat_region_is_rejected_by_aspect_ratio() {
        let img = page_with_bar(600, 800, PixelRect::new(100, 100, 160, 160));
        assert!(detect_pixel_redactions(&img, 150, 30, 3.0, 500).is_empty());
    }

    #[test]
    fn small_region_is_rejected_by_area() {
        let img = page_with_bar(600, 800, PixelRect::new(100, 100, 140, 108));
        assert!(detect_pixel_redactions(&img, 150, 30, 3.0, 500).is_empty());
    }

    #[test]
    fn gray_text_above_threshold_is_not_a_bar() {
        let mut img = GrayImage::from_pixel(600, 800, Luma([255]));
        for y in 100..125 {
            for x in 100..400 {
                img.put_pixel(x, y, Luma([120]));
            }
        }
        assert!(detect_pixel_redactions(&img, 150, 30, 3.0, 500).is_empty());
    }

    #[test]
    fn two_bars_yield_two_detections() {
        let mut img = page_with_bar(1240, 1754, PixelRect::new(100, 200, 400, 225));
        for y in 400..425 {
            for x in 500..900 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let out = detect_pixel_redactions(&img, 150, 30, 3.0, 500);
        assert_eq!(out.len(), 2);
    }
}
