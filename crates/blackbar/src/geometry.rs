//! Geometric primitives shared by every pipeline stage.
//!
//! Two coordinate systems coexist: PDF points (1/72 inch, `f64`, top-left
//! origin) and rendered pixels at a chosen DPI (`i32`, top-left origin).
//! Conversion between them is a pure scale; neither system flips the Y axis.

use serde::{Deserialize, Serialize};

/// A bounding box in PDF points, top-left origin, `x1 > x0` and `y1 > y0`.
///
/// Serialised as a `[x0, y0, x1, y1]` array to match the catalogue schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PointRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PointRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height() <= 0.0 {
            f64::INFINITY
        } else {
            self.width() / self.height()
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// True when the box has strictly positive extent on both axes.
    pub fn is_valid(&self) -> bool {
        self.x1 > self.x0 && self.y1 > self.y0
    }
}

impl From<[f64; 4]> for PointRect {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<PointRect> for [f64; 4] {
    fn from(r: PointRect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

/// A bounding box in rendered pixels, top-left origin.
///
/// Serialised as a `[x0, y0, x1, y1]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    /// Clamp the box to an image of `width`×`height` pixels. Returns `None`
    /// when nothing remains.
    pub fn clamped(&self, width: u32, height: u32) -> Option<PixelRect> {
        let x0 = self.x0.max(0);
        let y0 = self.y0.max(0);
        let x1 = self.x1.min(width as i32);
        let y1 = self.y1.min(height as i32);
        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(PixelRect::new(x0, y0, x1, y1))
        }
    }
}

impl From<[i32; 4]> for PixelRect {
    fn from(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<PixelRect> for [i32; 4] {
    fn from(r: PixelRect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

/// Convert a box in PDF points to rendered pixels at `dpi`.
pub fn points_to_pixels(rect: PointRect, dpi: u32) -> PixelRect {
    let scale = dpi as f64 / 72.0;
    PixelRect::new(
        (rect.x0 * scale).round() as i32,
        (rect.y0 * scale).round() as i32,
        (rect.x1 * scale).round() as i32,
        (rect.y1 * scale).round() as i32,
    )
}

/// Convert a box in rendered pixels back to PDF points.
pub fn pixels_to_points(rect: PixelRect, dpi: u32) -> PointRect {
    let scale = 72.0 / dpi as f64;
    PointRect::new(
        rect.x0 as f64 * scale,
        rect.y0 as f64 * scale,
        rect.x1 as f64 * scale,
        rect.y1 as f64 * scale,
    )
}

/// Intersection over union of two boxes in points.
///
/// Returns 0 when the boxes do not intersect or when either area is zero.
pub fn iou(a: PointRect, b: PointRect) -> f64 {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);

    if x1 <= x0 || y1 <= y0 {
        return 0.0;
    }

    let intersection = (x1 - x0) * (y1 - y0);
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

/// Union of two boxes: the smallest box containing both.
pub fn union_bbox(a: PointRect, b: PointRect) -> PointRect {
    PointRect::new(
        a.x0.min(b.x0),
        a.y0.min(b.y0),
        a.x1.max(b.x1),
        a.y1.max(b.y1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = PointRect::new(10.0, 10.0, 50.0, 20.0);
        assert!((iou(a, a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn iou_is_symmetric() {
        let a = PointRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PointRect::new(5.0, 5.0, 15.0, 15.0);
        assert!((iou(a, b) - iou(b, a)).abs() < 1e-12);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = PointRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PointRect::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(iou(a, b), 0.0);
    }

    #[test]
    fn iou_of_degenerate_box_is_zero() {
        let a = PointRect::new(0.0, 0.0, 0.0, 10.0);
        let b = PointRect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(iou(a, b), 0.0);
    }

    #[test]
    fn iou_stays_in_unit_interval() {
        let boxes = [
            PointRect::new(0.0, 0.0, 100.0, 12.0),
            PointRect::new(50.0, 0.0, 150.0, 12.0),
            PointRect::new(0.0, 6.0, 100.0, 18.0),
            PointRect::new(-5.0, -5.0, 5.0, 5.0),
        ];
        for a in boxes {
            for b in boxes {
                let v = iou(a, b);
                assert!((0.0..=1.0).contains(&v), "iou {v} out of range");
            }
        }
    }

    #[test]
    fn union_contains_both_inputs() {
        let a = PointRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PointRect::new(5.0, -5.0, 20.0, 8.0);
        let u = union_bbox(a, b);
        assert_eq!(u, PointRect::new(0.0, -5.0, 20.0, 10.0));
    }

    #[test]
    fn point_pixel_round_trip_within_one_pixel() {
        let dpi = 150;
        let rects = [
            PointRect::new(100.0, 300.0, 200.0, 312.0),
            PointRect::new(0.3, 0.7, 595.2, 841.9),
            PointRect::new(12.34, 56.78, 90.12, 345.67),
        ];
        for r in rects {
            let px = points_to_pixels(r, dpi);
            let back = points_to_pixels(pixels_to_points(px, dpi), dpi);
            assert!((px.x0 - back.x0).abs() <= 1);
            assert!((px.y0 - back.y0).abs() <= 1);
            assert!((px.x1 - back.x1).abs() <= 1);
            assert!((px.y1 - back.y1).abs() <= 1);
        }
    }

    #[test]
    fn pixel_width_tracks_point_width() {
        let dpi = 150;
        let r = PointRect::new(100.0, 300.0, 200.0, 312.0);
        let px = points_to_pixels(r, dpi);
        let expected = (r.width() * dpi as f64 / 72.0).round() as i32;
        assert!((px.width() - expected).abs() <= 1);
    }
}
