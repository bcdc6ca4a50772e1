//! Entity-type prediction for the text hidden by a redaction.
//!
//! Two passes over the surrounding context:
//! 1. hand-written regex patterns against the tail of `text_before` and the
//!    head of `text_after` (strong, 0.50-0.95);
//! 2. a placeholder-role pass over `before + "«REDACTED»" + after` that
//!    reads the gap's syntactic neighbourhood as weak evidence (0.35-0.55).
//!
//! The highest confidence per entity type wins.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entities::EntityType;

/// One predicted type for the gap, with its evidence strength.
#[derive(Debug, Clone, PartialEq)]
pub struct GapPrediction {
    pub entity_type: EntityType,
    pub confidence: f64,
    /// Which rule fired, for debugging.
    pub source: &'static str,
}

struct Pattern {
    regex: &'static Lazy<Regex>,
    /// Whether the pattern applies to the text before or after the gap.
    before: bool,
    entity_type: EntityType,
    confidence: f64,
    source: &'static str,
}

macro_rules! pat {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($re).expect("pattern"));
    };
}

// Patterns against the end of text_before.
pat!(TITLE_BEFORE, r"(?i)\b(mr|mrs|ms|dr|prof|judge|senator)\.?\s*$");
pat!(NAMED_CALLED, r"(?i)\b(named|called)\s*$");
pat!(SPEECH_VERB_BEFORE, r"(?i)\b(according to|testimony of|statement of|deposition of)\s*$");
pat!(LOCATION_PREP, r"(?i)\b(in|at|near|from|to)\s*$");
pat!(DOLLAR_PREFIX, r"\$\s*$");
pat!(ORG_ARTICLE, r"(?i)\bthe\s*$");
pat!(DATE_PREP, r"(?i)\b(on|dated|since|until)\s*$");

// Patterns against the start of text_after.
pat!(SPEECH_VERB_AFTER, r"(?i)^\s*(said|told|testified|stated|recalled|claimed|denied)\b");
pat!(ORG_SUFFIX_AFTER, r"(?i)^\s*(inc|llc|ltd|corp|foundation|university)\b");
pat!(WHO_AFTER, r"(?i)^\s*,?\s*who\b");
pat!(FLEW_BEFORE, r"(?i)\b(flew to|travelled to|traveled to|arrived in|visited)\s*$");

static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        Pattern { regex: &TITLE_BEFORE, before: true, entity_type: EntityType::Person, confidence: 0.95, source: "title-prefix" },
        Pattern { regex: &NAMED_CALLED, before: true, entity_type: EntityType::Person, confidence: 0.85, source: "named-called" },
        Pattern { regex: &SPEECH_VERB_BEFORE, before: true, entity_type: EntityType::Person, confidence: 0.70, source: "speech-verb-before" },
        Pattern { regex: &SPEECH_VERB_AFTER, before: false, entity_type: EntityType::Person, confidence: 0.70, source: "speech-verb-after" },
        Pattern { regex: &WHO_AFTER, before: false, entity_type: EntityType::Person, confidence: 0.55, source: "who-clause" },
        Pattern { regex: &FLEW_BEFORE, before: true, entity_type: EntityType::Gpe, confidence: 0.65, source: "travel-verb" },
        Pattern { regex: &LOCATION_PREP, before: true, entity_type: EntityType::Gpe, confidence: 0.50, source: "location-preposition" },
        Pattern { regex: &DOLLAR_PREFIX, before: true, entity_type: EntityType::Money, confidence: 0.80, source: "dollar-prefix" },
        Pattern { regex: &ORG_ARTICLE, before: true, entity_type: EntityType::Org, confidence: 0.35, source: "definite-article" },
        Pattern { regex: &ORG_SUFFIX_AFTER, before: false, entity_type: EntityType::Org, confidence: 0.75, source: "org-suffix" },
        Pattern { regex: &DATE_PREP, before: true, entity_type: EntityType::Date, confidence: 0.50, source: "date-preposition" },
    ]
});

/// The placeholder used when composing the context for the role pass.
pub const PLACEHOLDER: &str = "«REDACTED»";

/// Weak evidence from the placeholder's syntactic role in the composed
/// sentence: a gap followed by a finite verb reads as a subject (likely a
/// person), a gap preceded by a preposition as a place, and so on.
fn placeholder_role_predictions(before: &str, after: &str) -> Vec<GapPrediction> {
    let sentence = format!("{before} {PLACEHOLDER} {after}");
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| t.contains(PLACEHOLDER)) else {
        return Vec::new();
    };

    let mut predictions = Vec::new();
    const SUBJECT_VERBS: &[&str] = &[
        "was", "is", "were", "had", "has", "went", "met", "left", "arrived", "said", "did",
        "would", "could", "knew",
    ];

    if let Some(next) = tokens.get(pos + 1) {
        let next = next.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if SUBJECT_VERBS.contains(&next.as_str()) {
            predictions.push(GapPrediction {
                entity_type: EntityType::Person,
                confidence: 0.45,
                source: "subject-role",
            });
        }
    }
    if let Some(prev) = pos.checked_sub(1).and_then(|p| tokens.get(p)) {
        let prev = prev.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if ["in", "at", "near"].contains(&prev.as_str()) {
            predictions.push(GapPrediction {
                entity_type: EntityType::Loc,
                confidence: 0.40,
                source: "object-of-preposition",
            });
        }
        if ["met", "saw", "with", "and"].contains(&prev.as_str()) {
            predictions.push(GapPrediction {
                entity_type: EntityType::Person,
                confidence: 0.35,
                source: "object-role",
            });
        }
    }

    predictions
}

/// Predict the gap's entity types from its surrounding context.
///
/// Returns at most one prediction per entity type, the strongest evidence
/// for each.
pub fn predict_gap_type(text_before: &str, text_after: &str) -> Vec<GapPrediction> {
    let mut best: HashMap<EntityType, GapPrediction> = HashMap::new();

    let mut consider = |p: GapPrediction| {
        best.entry(p.entity_type)
            .and_modify(|existing| {
                if p.confidence > existing.confidence {
                    *existing = p.clone();
                }
            })
            .or_insert(p);
    };

    for pattern in PATTERNS.iter() {
        let haystack = if pattern.before { text_before } else { text_after };
        if pattern.regex.is_match(haystack) {
            consider(GapPrediction {
                entity_type: pattern.entity_type,
                confidence: pattern.confidence,
                source: pattern.source,
            });
        }
    }

    for p in placeholder_role_predictions(text_before, text_after) {
        consider(p);
    }

    let mut predictions: Vec<GapPrediction> = best.into_values().collect();
    predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    predictions
}
