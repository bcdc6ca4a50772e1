//! Per-character advance-width fingerprinting.
//!
//! A width profile maps each character observed near the redaction to its
//! mean advance at 1 em, measured from consecutive character origins on the
//! redaction's line and up to three lines either side. Matching a profile
//! against the candidate pool is purely analytical: lowest RMSE wins, and
//! the rendering parameters fall out of the residuals.

use std::collections::HashMap;

use crate::types::TextChar;

use super::CandidateFont;

/// Vertical clustering tolerance when grouping characters into lines, in
/// points.
const LINE_TOLERANCE_PT: f64 = 3.0;
/// Lines considered on each side of the redaction's line.
const NEIGHBOUR_LINES: usize = 3;

/// Per-character mean normalised advances (at 1 em).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidthProfile {
    advances: HashMap<char, f64>,
    /// Mean font size of the contributing characters, in points.
    pub font_size_pt: Option<f64>,
}

impl WidthProfile {
    pub fn is_empty(&self) -> bool {
        self.advances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.advances.len()
    }

    pub fn advance(&self, ch: char) -> Option<f64> {
        self.advances.get(&ch).copied()
    }

    pub fn chars(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.advances.iter().map(|(c, w)| (*c, *w))
    }

    /// Build a profile from the page's characters, centred on the line
    /// nearest `redaction_y_center` (in points).
    pub fn build(chars: &[TextChar], redaction_y_center: f64) -> WidthProfile {
        let lines = group_into_lines(chars);
        if lines.is_empty() {
            return WidthProfile::default();
        }

        let nearest = lines
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (line_center(a) - redaction_y_center).abs();
                let db = (line_center(b) - redaction_y_center).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        let start = nearest.saturating_sub(NEIGHBOUR_LINES);
        let end = (nearest + NEIGHBOUR_LINES + 1).min(lines.len());

        let mut samples: HashMap<char, Vec<f64>> = HashMap::new();
        let mut font_sizes = Vec::new();

        for line in &lines[start..end] {
            for pair in line.windows(2) {
                let (cur, next) = (&pair[0], &pair[1]);
                if cur.font_size < 1.0 || (cur.font_size - next.font_size).abs() > 0.01 {
                    continue;
                }
                let advance = next.origin.0 - cur.origin.0;
                // Non-positive advances are column wraps; very large ones
                // straddle a gap (the redaction itself, a tab stop).
                if advance <= 0.0 || advance > cur.font_size * 3.0 {
                    continue;
                }
                samples
                    .entry(cur.ch)
                    .or_default()
                    .push(advance / cur.font_size);
            }
            font_sizes.extend(line.iter().map(|c| c.font_size));
        }

        let advances = samples
            .into_iter()
            .map(|(c, widths)| {
                let mean = widths.iter().sum::<f64>() / widths.len() as f64;
                (c, mean)
            })
            .collect();

        let font_size_pt = if font_sizes.is_empty() {
            None
        } else {
            Some(font_sizes.iter().sum::<f64>() / font_sizes.len() as f64)
        };

        WidthProfile {
            advances,
            font_size_pt,
        }
    }
}

fn line_center(line: &[TextChar]) -> f64 {
    line.iter().map(|c| c.y_center()).sum::<f64>() / line.len() as f64
}

/// Cluster characters into lines by vertical centre, then sort each line
/// left-to-right.
fn group_into_lines(chars: &[TextChar]) -> Vec<Vec<TextChar>> {
    if chars.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<TextChar> = chars.to_vec();
    sorted.sort_by(|a, b| a.y_center().total_cmp(&b.y_center()));

    let mut lines: Vec<Vec<TextChar>> = Vec::new();
    let mut current = vec![sorted[0]];
    for ch in sorted.into_iter().skip(1) {
        if (ch.y_center() - current[0].y_center()).abs() <= LINE_TOLERANCE_PT {
            current.push(ch);
        } else {
            lines.push(std::mem::replace(&mut current, vec![ch]));
        }
    }
    lines.push(current);

    for line in &mut lines {
        line.sort_by(|a, b| a.origin.0.total_cmp(&b.origin.0));
    }
    lines
}

/// RMSE between the profile's normalised widths and a candidate font's
/// glyph advances, over characters present in both. Infinite when nothing
/// overlaps.
pub fn char_rmse(profile: &WidthProfile, font: &CandidateFont) -> f64 {
    let mut total = 0.0;
    let mut n = 0usize;
    for (ch, pdf_width) in profile.chars() {
        if let Some(glyph_width) = font.advance(ch) {
            if glyph_width > 0.0 {
                total += (pdf_width - glyph_width).powi(2);
                n += 1;
            }
        }
    }
    if n == 0 {
        f64::INFINITY
    } else {
        (total / n as f64).sqrt()
    }
}

/// The matched font with its RMSE.
#[derive(Debug, Clone, Copy)]
pub struct FontMatch {
    pub font: &'static CandidateFont,
    pub rmse: f64,
}

/// Pick the pool font with the lowest RMSE against the profile.
///
/// Returns `None` when the profile is empty or no candidate shares any
/// character with it — "no font identified"; the width filter then runs
/// untrusted.
pub fn best_font(profile: &WidthProfile) -> Option<FontMatch> {
    if profile.is_empty() {
        return None;
    }
    super::candidate_fonts()
        .iter()
        .map(|font| FontMatch {
            font,
            rmse: char_rmse(profile, font),
        })
        .filter(|m| m.rmse.is_finite())
        .min_by(|a, b| a.rmse.total_cmp(&b.rmse))
}

/// Parameters that reproduce the PDF's text rendering with the matched
/// font: a horizontal scale, uniform letter spacing, and extra word
/// spacing, all in em units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderingParams {
    pub scale_x: f64,
    pub letter_spacing: f64,
    pub word_spacing: f64,
}

impl Default for RenderingParams {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            letter_spacing: 0.0,
            word_spacing: 0.0,
        }
    }
}

/// Derive rendering parameters analytically from the profile residuals.
pub fn estimate_rendering_params(profile: &WidthProfile, font: &CandidateFont) -> RenderingParams {
    let mut ratios = Vec::new();
    for (ch, pdf_width) in profile.chars() {
        if ch == ' ' {
            continue;
        }
        if let Some(glyph) = font.advance(ch) {
            if glyph > 0.001 {
                ratios.push(pdf_width / glyph);
            }
        }
    }
    if ratios.is_empty() {
        return RenderingParams::default();
    }

    ratios.sort_by(f64::total_cmp);
    let scale_x = ratios[ratios.len() / 2];

    let mut residuals = Vec::new();
    for (ch, pdf_width) in profile.chars() {
        if ch == ' ' {
            continue;
        }
        if let Some(glyph) = font.advance(ch) {
            if glyph > 0.001 {
                residuals.push(pdf_width - glyph * scale_x);
            }
        }
    }
    let letter_spacing = if residuals.is_empty() {
        0.0
    } else {
        residuals.iter().sum::<f64>() / residuals.len() as f64
    };

    let word_spacing = match (profile.advance(' '), font.advance(' ')) {
        (Some(space_pdf), Some(space_glyph)) if space_glyph > 0.0 => {
            space_pdf - (space_glyph * scale_x + letter_spacing)
        }
        _ => 0.0,
    };

    RenderingParams {
        scale_x,
        letter_spacing,
        word_spacing,
    }
}
