//! Candidate pools and scored identification results.

use serde::{Deserialize, Serialize};

/// A named, read-only set of candidate strings.
///
/// Lists come from curated files or scraped sources; scraped entries are
/// filtered to plausible names of 3..=60 characters at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateList {
    pub name: String,
    pub entries: Vec<String>,
}

/// A scored candidate for a single redaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub text: String,
    /// Weighted total in `[0, 1]`-ish range (same-doc bonus can push the
    /// maximum slightly above the weight sum).
    pub total: f64,
    pub width_fit: f64,
    /// Rendered width divided by the target width.
    pub width_ratio: f64,
    /// Rendered width in points at the page font size.
    pub width_pt: f64,
    pub nlp_score: f64,
    pub leakage_score: f64,
    pub corpus_freq: f64,
    pub doc_score: f64,
}

/// Ranked candidates for one redaction, as written to `candidates.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionCandidates {
    pub doc_id: String,
    pub page_num: u32,
    pub redaction_index: u32,
    /// Name of the matched candidate font, if the fingerprint succeeded.
    pub font_name: Option<String>,
    /// RMSE of the matched font against the width profile.
    pub font_rmse: Option<f64>,
    /// Measured inter-character gap in points, when both neighbours exist.
    pub gap_pt: Option<f64>,
    /// Candidates with `width_fit > 0`, best first.
    pub candidates: Vec<CandidateScore>,
    /// Rejected near-misses kept for debugging, best first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub near_misses: Vec<CandidateScore>,
}
