//! Candidate font pool and per-character advance lookup.
//!
//! The pool combines the twelve built-in core fonts (static AFM tables)
//! with whatever common system font files can be found and parsed on this
//! machine. It is loaded once per process, on first use, and is read-only
//! afterwards; concurrent readers share it by reference.

pub mod builtin;
pub mod profile;

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

pub use builtin::{BUILTIN_FONTS, BuiltinMetrics};
pub use profile::{
    FontMatch, RenderingParams, WidthProfile, best_font, char_rmse, estimate_rendering_params,
};

/// Common system font files worth probing, per display name.
///
/// The first path that exists and parses wins; missing files are skipped
/// silently. Liberation fonts are metric-compatible stand-ins for the
/// Microsoft core fonts on most Linux installs.
static SYSTEM_FONT_FILES: &[(&str, bool, bool, &[&str])] = &[
    (
        "Arial",
        false,
        false,
        &[
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ],
    ),
    (
        "Arial Bold",
        true,
        false,
        &[
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Arial_Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ],
    ),
    (
        "Georgia",
        false,
        false,
        &[
            "/System/Library/Fonts/Supplemental/Georgia.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Georgia.ttf",
        ],
    ),
    (
        "Verdana",
        false,
        false,
        &[
            "/System/Library/Fonts/Supplemental/Verdana.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Verdana.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ],
    ),
    (
        "Trebuchet MS",
        false,
        false,
        &[
            "/System/Library/Fonts/Supplemental/Trebuchet MS.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Trebuchet_MS.ttf",
        ],
    ),
    (
        "Liberation Serif",
        false,
        false,
        &["/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf"],
    ),
];

enum AdvanceSource {
    /// Static AFM table, 1/1000 em units.
    Table(&'static [u16; 95]),
    /// Advances extracted from a parsed font file, already in ems.
    Map(HashMap<char, f64>),
}

/// One font the fingerprinter can match against.
pub struct CandidateFont {
    pub name: String,
    pub is_bold: bool,
    pub is_italic: bool,
    advances: AdvanceSource,
}

impl CandidateFont {
    /// Advance width of `ch` in ems (at a nominal size of 1 pt), if known.
    pub fn advance(&self, ch: char) -> Option<f64> {
        match &self.advances {
            AdvanceSource::Table(widths) => builtin::table_advance(widths, ch),
            AdvanceSource::Map(map) => map.get(&ch).copied(),
        }
    }
}

impl std::fmt::Debug for CandidateFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFont")
            .field("name", &self.name)
            .field("is_bold", &self.is_bold)
            .field("is_italic", &self.is_italic)
            .finish()
    }
}

/// Extract em-normalised advances for the printable ASCII range from a
/// font file. Returns `None` when the file is missing or unparsable.
fn advances_from_file(path: &Path) -> Option<HashMap<char, f64>> {
    let data = std::fs::read(path).ok()?;
    let face = ttf_parser::Face::parse(&data, 0).ok()?;
    let units_per_em = face.units_per_em() as f64;
    if units_per_em <= 0.0 {
        return None;
    }

    let mut map = HashMap::new();
    for ch in ' '..='~' {
        if let Some(glyph) = face.glyph_index(ch) {
            if let Some(advance) = face.glyph_hor_advance(glyph) {
                map.insert(ch, advance as f64 / units_per_em);
            }
        }
    }
    if map.is_empty() { None } else { Some(map) }
}

fn load_pool() -> Vec<CandidateFont> {
    let mut fonts: Vec<CandidateFont> = BUILTIN_FONTS
        .iter()
        .map(|m| CandidateFont {
            name: m.name.to_string(),
            is_bold: m.is_bold,
            is_italic: m.is_italic,
            advances: AdvanceSource::Table(m.widths),
        })
        .collect();

    for (name, bold, italic, paths) in SYSTEM_FONT_FILES {
        for path in *paths {
            let path = Path::new(path);
            if !path.is_file() {
                continue;
            }
            if let Some(map) = advances_from_file(path) {
                tracing::debug!(font = *name, path = %path.display(), "loaded system font");
                fonts.push(CandidateFont {
                    name: name.to_string(),
                    is_bold: *bold,
                    is_italic: *italic,
                    advances: AdvanceSource::Map(map),
                });
            }
            break;
        }
    }

    fonts
}

static CANDIDATE_FONTS: Lazy<Vec<CandidateFont>> = Lazy::new(load_pool);

/// The process-wide candidate font pool. Initialised on first call.
pub fn candidate_fonts() -> &'static [CandidateFont] {
    &CANDIDATE_FONTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_contains_the_twelve_builtins() {
        let names: Vec<&str> = candidate_fonts().iter().map(|f| f.name.as_str()).collect();
        for expected in [
            "Helvetica",
            "Times Roman",
            "Courier",
            "Times Bold-Italic",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert!(candidate_fonts().len() >= 12);
    }

    #[test]
    fn pool_is_shared_by_reference() {
        let a = candidate_fonts().as_ptr();
        let b = candidate_fonts().as_ptr();
        assert_eq!(a, b);
    }

    #[test]
    fn builtin_advance_lookup_works_through_the_pool() {
        let times = candidate_fonts()
            .iter()
            .find(|f| f.name == "Times Roman")
            .unwrap();
        assert_eq!(times.advance('a'), Some(0.444));
        assert_eq!(times.advance(' '), Some(0.25));
    }
}
