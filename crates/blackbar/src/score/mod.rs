//! Multi-signal candidate scoring.
//!
//! Every candidate string is rendered at the page's font size with the
//! fingerprinted font and compared against the measured gap; survivors are
//! scored on entity-type predictions, leakage consistency, corpus
//! frequency, and same-document occurrence.

pub mod nlp;

pub use nlp::{GapPrediction, PLACEHOLDER, predict_gap_type};

use crate::config::ScoreWeights;
use crate::entities::EntityIndex;
use crate::fonts::{CandidateFont, RenderingParams, WidthProfile};
use crate::leakage::LeakageReport;
use crate::types::CandidateScore;

/// Width tolerance when a precise gap measurement exists.
const TOLERANCE_PRECISE: f64 = 0.03;
/// Width tolerance when only the bar's own width is available.
const TOLERANCE_LOOSE: f64 = 0.15;
/// Width fit assigned to every candidate when no font was identified and
/// widths cannot be trusted.
const UNTRUSTED_WIDTH_FIT: f64 = 0.5;
/// Fallback glyph advance, in ems, for characters no source knows.
const FALLBACK_ADVANCE: f64 = 0.5;

/// What the candidate's rendered width is compared against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthTarget {
    pub target_pt: f64,
    /// True when the target came from a precise gap measurement.
    pub precise: bool,
    /// Pad the candidate with a leading/trailing space before measuring.
    pub pad_before: bool,
    pub pad_after: bool,
}

impl WidthTarget {
    /// Target from the bar's own width: loose tolerance, no padding.
    pub fn from_bar_width(width_pt: f64) -> Self {
        Self {
            target_pt: width_pt,
            precise: false,
            pad_before: false,
            pad_after: false,
        }
    }

    pub fn tolerance(&self) -> f64 {
        if self.precise {
            TOLERANCE_PRECISE
        } else {
            TOLERANCE_LOOSE
        }
    }
}

/// A candidate with its rendered width and fit against the target.
#[derive(Debug, Clone, PartialEq)]
pub struct WidthResult {
    pub text: String,
    pub width_pt: f64,
    pub width_ratio: f64,
    pub width_fit: f64,
}

/// The font evidence available for width rendering.
#[derive(Debug, Clone, Copy)]
pub struct FontEvidence<'a> {
    pub profile: &'a WidthProfile,
    pub font: &'a CandidateFont,
    pub params: RenderingParams,
}

/// Advance of one character in ems: the page's own measurement when the
/// profile has it, otherwise the matched font adjusted by the rendering
/// parameters.
fn char_advance(ch: char, evidence: &FontEvidence<'_>) -> f64 {
    if let Some(measured) = evidence.profile.advance(ch) {
        return measured;
    }
    let glyph = evidence.font.advance(ch).unwrap_or(FALLBACK_ADVANCE);
    let mut advance = glyph * evidence.params.scale_x + evidence.params.letter_spacing;
    if ch == ' ' {
        advance += evidence.params.word_spacing;
    }
    advance
}

/// Rendered width of `text` in points at `font_size_pt`.
pub fn rendered_width_pt(text: &str, font_size_pt: f64, evidence: &FontEvidence<'_>) -> f64 {
    let ems: f64 = text.chars().map(|c| char_advance(c, evidence)).sum();
    ems * font_size_pt
}

/// Filter candidates by rendered width against the target.
///
/// With `evidence` absent (no font identified), every candidate passes with
/// the untrusted fit of 0.5 and no measured width.
pub fn filter_by_width(
    candidates: &[String],
    target: WidthTarget,
    font_size_pt: f64,
    evidence: Option<&FontEvidence<'_>>,
) -> Vec<WidthResult> {
    let Some(evidence) = evidence else {
        return candidates
            .iter()
            .map(|text| WidthResult {
                text: text.clone(),
                width_pt: 0.0,
                width_ratio: 0.0,
                width_fit: UNTRUSTED_WIDTH_FIT,
            })
            .collect();
    };

    let tolerance = target.tolerance();
    candidates
        .iter()
        .map(|text| {
            let mut rendered = String::with_capacity(text.len() + 2);
            if target.pad_before {
                rendered.push(' ');
            }
            rendered.push_str(text);
            if target.pad_after {
                rendered.push(' ');
            }

            let width_pt = rendered_width_pt(&rendered, font_size_pt, evidence);
            let width_ratio = if target.target_pt > 0.0 {
                width_pt / target.target_pt
            } else {
                0.0
            };
            let width_fit = (1.0 - (width_ratio - 1.0).abs() / tolerance).max(0.0);

            WidthResult {
                text: text.clone(),
                width_pt,
                width_ratio,
                width_fit,
            }
        })
        .collect()
}

/// Letters whose forms rise above x-height (plus digits, which share the
/// cap band).
fn has_ascender_chars(text: &str) -> bool {
    text.chars()
        .any(|c| "bdfhklt".contains(c) || c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Letters whose forms drop below the baseline.
fn has_descender_chars(text: &str) -> bool {
    text.chars().any(|c| "gjpqyQJ".contains(c))
}

/// Consistency between a candidate's character classes and the observed
/// edge fragments: agreement is rewarded, mismatch mildly penalised, and
/// fragment-free bars reward candidates with no ascenders/descenders.
/// Clamped to `[0, 1]`.
pub fn leakage_consistency(candidate: &str, report: &LeakageReport) -> f64 {
    let mut score: f64 = 0.5;

    let observed_ascender = !report.top.is_empty() || !report.left.is_empty();
    let observed_descender = !report.bottom.is_empty() || !report.right.is_empty();

    if observed_ascender {
        score += if has_ascender_chars(candidate) { 0.25 } else { -0.15 };
    } else {
        score += if has_ascender_chars(candidate) { -0.1 } else { 0.15 };
    }

    if observed_descender {
        score += if has_descender_chars(candidate) { 0.25 } else { -0.15 };
    } else {
        score += if has_descender_chars(candidate) { -0.1 } else { 0.15 };
    }

    score.clamp(0.0, 1.0)
}

/// Everything the combiner needs beyond the width results.
pub struct ScoreContext<'a> {
    pub predictions: &'a [GapPrediction],
    pub leakage: &'a LeakageReport,
    pub index: &'a EntityIndex,
    pub doc_id: &'a str,
    pub weights: ScoreWeights,
}

/// Combine all signals into a total score per candidate, best first.
pub fn score_candidates(
    width_results: Vec<WidthResult>,
    ctx: &ScoreContext<'_>,
) -> Vec<CandidateScore> {
    let max_count = ctx.index.max_count();

    let mut scored: Vec<CandidateScore> = width_results
        .into_iter()
        .map(|w| {
            // A candidate matches a predicted type only when the corpus has
            // actually seen it as that type.
            let nlp_score = ctx
                .predictions
                .iter()
                .filter(|p| ctx.index.occurs_as(&w.text, p.entity_type))
                .map(|p| p.confidence)
                .fold(0.0, f64::max);

            let leakage_score = leakage_consistency(&w.text, ctx.leakage);

            let corpus_freq = if max_count > 0 {
                ctx.index.corpus_count(&w.text) as f64 / max_count as f64
            } else {
                0.0
            };

            let doc_score = if ctx.index.in_document(ctx.doc_id, &w.text) {
                0.3
            } else {
                0.0
            };

            let weights = ctx.weights;
            let total = weights.width_fit * w.width_fit
                + weights.nlp * nlp_score
                + weights.leakage * leakage_score
                + weights.corpus_freq * corpus_freq
                + weights.same_doc * doc_score;

            CandidateScore {
                text: w.text,
                total,
                width_fit: w.width_fit,
                width_ratio: w.width_ratio,
                width_pt: w.width_pt,
                nlp_score,
                leakage_score,
                corpus_freq,
                doc_score,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.total.total_cmp(&a.total));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityType;
    use crate::fonts::{best_font, candidate_fonts, estimate_rendering_params};
    use crate::leakage::Fragment;

    fn times_evidence() -> FontEvidence<'static> {
        static PROFILE: once_cell::sync::Lazy<WidthProfile> =
            once_cell::sync::Lazy::new(WidthProfile::default);
        let font = candidate_fonts()
            .iter()
            .find(|f| f.name == "Times Roman")
            .unwrap();
        FontEvidence {
            profile: once_cell::sync::Lazy::force(&PROFILE),
            font,
            params: RenderingParams::default(),
        }
    }

    fn times_width(text: &str, size: f64) -> f64 {
        rendered_width_pt(text, size, &times_evidence())
    }

    #[test]
    fn width_filter_accepts_exact_match_rejects_others() {
        let evidence = times_evidence();
        let target = WidthTarget {
            target_pt: times_width("John Smith", 12.0),
            precise: true,
            pad_before: false,
            pad_after: false,
        };
        let candidates = vec![
            "John Smith".to_string(),
            "Jane Doe".to_string(),
            "Eisenhower".to_string(),
        ];
        let results = filter_by_width(&candidates, target, 12.0, Some(&evidence));

        let fit = |name: &str| {
            results
                .iter()
                .find(|r| r.text == name)
                .map(|r| r.width_fit)
                .unwrap()
        };
        assert!(fit("John Smith") > 0.0);
        assert_eq!(fit("Jane Doe"), 0.0);
        assert_eq!(fit("Eisenhower"), 0.0);
    }

    #[test]
    fn width_is_linear_in_font_size() {
        let w12 = times_width("John Smith", 12.0);
        let w24 = times_width("John Smith", 24.0);
        assert!((w24 / 24.0 - w12 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn padding_spaces_widen_the_candidate() {
        let evidence = times_evidence();
        let bare = WidthTarget {
            target_pt: 100.0,
            precise: true,
            pad_before: false,
            pad_after: false,
        };
        let padded = WidthTarget {
            pad_before: true,
            pad_after: true,
            ..bare
        };
        let c = vec!["John Smith".to_string()];
        let w_bare = filter_by_width(&c, bare, 12.0, Some(&evidence))[0].width_pt;
        let w_padded = filter_by_width(&c, padded, 12.0, Some(&evidence))[0].width_pt;
        // Two Times spaces at 12pt: 2 * 0.25 * 12 = 6pt.
        assert!((w_padded - w_bare - 6.0).abs() < 1e-9);
    }

    #[test]
    fn no_font_means_untrusted_flat_fit() {
        let c = vec!["Anything".to_string(), "At All".to_string()];
        let results = filter_by_width(&c, WidthTarget::from_bar_width(80.0), 12.0, None);
        assert!(results.iter().all(|r| r.width_fit == 0.5));
        assert!(results.iter().all(|r| r.width_pt == 0.0));
    }

    fn fragment() -> Fragment {
        Fragment {
            extent: 4,
            dark_pixels: 12,
            density: 0.5,
        }
    }

    #[test]
    fn leakage_rewards_agreement_and_penalises_mismatch() {
        let with_ascenders = LeakageReport {
            top: vec![fragment()],
            ..Default::default()
        };
        // "bell" has ascenders, "erase" has none.
        assert!(
            leakage_consistency("bell", &with_ascenders)
                > leakage_consistency("erase", &with_ascenders)
        );

        let clean = LeakageReport::default();
        assert!(leakage_consistency("among", &clean) > leakage_consistency("July", &clean));
    }

    #[test]
    fn leakage_score_stays_in_unit_interval() {
        let reports = [
            LeakageReport::default(),
            LeakageReport {
                top: vec![fragment()],
                bottom: vec![fragment()],
                ..Default::default()
            },
        ];
        for report in &reports {
            for text in ["gyp", "BELL", "aeu", "Jg"] {
                let s = leakage_consistency(text, report);
                assert!((0.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn scoring_ranks_the_corroborated_candidate_first() {
        let mut index = EntityIndex::new();
        index.add_document(
            "doc-1",
            "Mr. John Smith testified. John Smith owned the aircraft.",
        );
        index.add_document("doc-2", "Jane Doe was absent.");

        let predictions = vec![GapPrediction {
            entity_type: EntityType::Person,
            confidence: 0.95,
            source: "title-prefix",
        }];
        let leakage = LeakageReport::default();
        let ctx = ScoreContext {
            predictions: &predictions,
            leakage: &leakage,
            index: &index,
            doc_id: "doc-1",
            weights: ScoreWeights::default(),
        };

        let width_results = vec![
            WidthResult {
                text: "John Smith".into(),
                width_pt: 54.0,
                width_ratio: 1.0,
                width_fit: 1.0,
            },
            WidthResult {
                text: "Jane Doe".into(),
                width_pt: 54.0,
                width_ratio: 1.0,
                width_fit: 1.0,
            },
        ];
        let scored = score_candidates(width_results, &ctx);

        assert_eq!(scored[0].text, "John Smith");
        assert!(scored[0].nlp_score >= 0.95);
        assert_eq!(scored[0].doc_score, 0.3);
        assert_eq!(scored[1].doc_score, 0.0);
        assert!(scored[0].total > scored[1].total);
    }
}
