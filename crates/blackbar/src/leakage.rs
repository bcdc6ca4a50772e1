//! Edge-band leakage detection.
//!
//! Letterforms taller than the redaction bar leave fragments just outside
//! its edges: ascender tops above, descender bottoms below, and partial
//! glyphs to either side. This module scans four bands around the bar for
//! dark-pixel fragments that are *connected* to the bar edge, which is what
//! separates real leakage from nearby text that merely drifts into the band.
//!
//! The few pixels immediately adjacent to the bar are skipped: that zone is
//! the anti-aliased box edge, not leakage.

use image::GrayImage;

use crate::geometry::PixelRect;

/// Pixels below this value count as letterform ink.
const DARK_TEXT_THRESHOLD: u8 = 128;
/// Minimum dark-pixel density of a qualifying fragment.
const MIN_FRAGMENT_DENSITY: f64 = 0.03;
/// Minimum fragment extent along the bar edge, in pixels.
const MIN_FRAGMENT_EXTENT: u32 = 2;
/// A fragment must place ink within this many rows/columns of the bar edge.
const EDGE_CONTACT_DEPTH: u32 = 3;

/// Which side of the bar a band sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Top,
    Bottom,
    Left,
    Right,
}

/// A connected dark-pixel fragment found in an edge band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Extent along the bar edge, in pixels.
    pub extent: u32,
    /// Dark pixels inside the fragment.
    pub dark_pixels: u32,
    /// Dark pixels divided by the fragment's band area.
    pub density: f64,
}

/// Per-band leakage analysis for one redaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeakageReport {
    pub top: Vec<Fragment>,
    pub bottom: Vec<Fragment>,
    pub left: Vec<Fragment>,
    pub right: Vec<Fragment>,
}

impl LeakageReport {
    /// Documented historical behaviour: the ascender flag is the OR of the
    /// top *and* left bands (and descender of bottom and right). Callers
    /// needing the per-band distinction should inspect the fragment lists.
    pub fn has_ascender_leakage(&self) -> bool {
        !self.top.is_empty() || !self.left.is_empty()
    }

    pub fn has_descender_leakage(&self) -> bool {
        !self.bottom.is_empty() || !self.right.is_empty()
    }

    pub fn pixels_top(&self) -> u32 {
        self.top.iter().map(|f| f.dark_pixels).sum()
    }

    pub fn pixels_bottom(&self) -> u32 {
        self.bottom.iter().map(|f| f.dark_pixels).sum()
    }
}

/// Geometry of one band in image coordinates, plus which edge of the band
/// touches the bar.
struct BandRegion {
    rect: PixelRect,
    band: Band,
}

fn band_regions(bbox: PixelRect, font_size_px: f64, dpi: u32) -> Vec<BandRegion> {
    let h_band = ((font_size_px * 0.25).round() as i32).max(3);
    let v_band = ((font_size_px * 0.30).round() as i32).max(3);
    let inset = ((dpi / 100) as i32).max(2);

    vec![
        BandRegion {
            rect: PixelRect::new(
                bbox.x0,
                bbox.y0 - inset - h_band,
                bbox.x1,
                bbox.y0 - inset,
            ),
            band: Band::Top,
        },
        BandRegion {
            rect: PixelRect::new(
                bbox.x0,
                bbox.y1 + inset,
                bbox.x1,
                bbox.y1 + inset + h_band,
            ),
            band: Band::Bottom,
        },
        BandRegion {
            rect: PixelRect::new(
                bbox.x0 - inset - v_band,
                bbox.y0,
                bbox.x0 - inset,
                bbox.y1,
            ),
            band: Band::Left,
        },
        BandRegion {
            rect: PixelRect::new(
                bbox.x1 + inset,
                bbox.y0,
                bbox.x1 + inset + v_band,
                bbox.y1,
            ),
            band: Band::Right,
        },
    ]
}

fn is_dark(raster: &GrayImage, x: i32, y: i32) -> bool {
    raster.get_pixel(x as u32, y as u32).0[0] < DARK_TEXT_THRESHOLD
}

/// Scan one band for qualifying fragments.
///
/// The scan walks positions along the bar edge (columns for top/bottom,
/// rows for left/right), groups consecutive inked positions into runs, and
/// keeps a run only when its extent, edge contact, and density all qualify.
fn scan_band(
    raster: &GrayImage,
    region: &BandRegion,
    font_size_px: f64,
) -> Vec<Fragment> {
    let rect = match region.rect.clamped(raster.width(), raster.height()) {
        Some(r) => r,
        // Out of bounds: treat as an empty result, never an error.
        None => return Vec::new(),
    };

    let horizontal = matches!(region.band, Band::Top | Band::Bottom);
    let (along_start, along_end, depth_start, depth_end) = if horizontal {
        (rect.x0, rect.x1, rect.y0, rect.y1)
    } else {
        (rect.y0, rect.y1, rect.x0, rect.x1)
    };
    let depth = (depth_end - depth_start) as u32;
    if depth == 0 {
        return Vec::new();
    }

    // The band rows/columns closest to the bar, where real leakage must
    // place at least one dark pixel.
    let contact_range: Vec<i32> = match region.band {
        Band::Top => ((depth_end - EDGE_CONTACT_DEPTH as i32).max(depth_start)..depth_end).collect(),
        Band::Bottom => {
            (depth_start..(depth_start + EDGE_CONTACT_DEPTH as i32).min(depth_end)).collect()
        }
        Band::Left => ((depth_end - EDGE_CONTACT_DEPTH as i32).max(depth_start)..depth_end).collect(),
        Band::Right => {
            (depth_start..(depth_start + EDGE_CONTACT_DEPTH as i32).min(depth_end)).collect()
        }
    };

    let max_extent = if horizontal {
        (font_size_px * 1.2).round() as u32
    } else {
        (font_size_px * 0.8).round() as u32
    };

    let mut fragments = Vec::new();
    let mut run_start: Option<i32> = None;
    let mut run_dark = 0u32;
    let mut run_touches_edge = false;

    let mut flush = |start: Option<i32>, end: i32, dark: u32, touches: bool| {
        let Some(start) = start else { return };
        let extent = (end - start) as u32;
        if extent < MIN_FRAGMENT_EXTENT || extent > max_extent {
            return;
        }
        if !touches {
            return;
        }
        let density = dark as f64 / (extent as f64 * depth as f64);
        if density < MIN_FRAGMENT_DENSITY {
            return;
        }
        fragments.push(Fragment {
            extent,
            dark_pixels: dark,
            density,
        });
    };

    for along in along_start..along_end {
        let mut column_dark = 0u32;
        let mut column_touches = false;
        for d in depth_start..depth_end {
            let (x, y) = if horizontal { (along, d) } else { (d, along) };
            if is_dark(raster, x, y) {
                column_dark += 1;
                if contact_range.contains(&d) {
                    column_touches = true;
                }
            }
        }

        if column_dark > 0 {
            if run_start.is_none() {
                run_start = Some(along);
                run_dark = 0;
                run_touches_edge = false;
            }
            run_dark += column_dark;
            run_touches_edge |= column_touches;
        } else if run_start.is_some() {
            flush(run_start, along, run_dark, run_touches_edge);
            run_start = None;
        }
    }
    flush(run_start, along_end, run_dark, run_touches_edge);

    fragments
}

/// Analyse the four edge bands of a redaction box on a page raster.
pub fn analyze_leakage(
    raster: &GrayImage,
    bbox: PixelRect,
    font_size_px: f64,
    dpi: u32,
) -> LeakageReport {
    let mut report = LeakageReport::default();
    for region in band_regions(bbox, font_size_px, dpi) {
        let fragments = scan_band(raster, &region, font_size_px);
        match region.band {
            Band::Top => report.top = fragments,
            Band::Bottom => report.bottom = fragments,
            Band::Left => report.left = fragments,
            Band::Right => report.right = fragments,
        }
    }
    report
}
