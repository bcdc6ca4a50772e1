//! Aggregate statistics for `summary.json`.

use serde::{Deserialize, Serialize};

use crate::config::ExtractionParams;
use crate::types::{CorpusResult, DetectionMethod};

/// Count, mean, median, sample standard deviation, min, and max of a value
/// distribution. All zero for an empty distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };

        let std = if count > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Self {
            count,
            mean: round2(mean),
            median: round2(median),
            std: round2(std),
            min: sorted[0],
            max: sorted[count - 1],
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// One histogram bucket `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub range: String,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

fn histogram(values: &[f64], edges: &[(f64, f64)]) -> Vec<HistogramBucket> {
    edges
        .iter()
        .map(|&(lo, hi)| HistogramBucket {
            range: if hi.is_finite() {
                format!("{lo}-{hi}")
            } else {
                format!("{lo}+")
            },
            min: lo,
            max: hi,
            count: values.iter().filter(|&&v| v >= lo && v < hi).count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_documents: usize,
    pub total_pages: u32,
    pub total_redactions: usize,
    pub documents_with_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCountStats {
    pub distribution: DistributionStats,
    pub histogram: Vec<HistogramBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBreakdown {
    pub pdf_structure_only: usize,
    pub pixel_only: usize,
    pub both_methods: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageStats {
    pub ascender_hits: usize,
    pub descender_hits: usize,
    pub total_with_leakage: usize,
    pub leakage_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilineStats {
    pub total_multiline_redactions: usize,
    pub total_multiline_groups: usize,
    pub multiline_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeStats {
    pub width_points: DistributionStats,
    pub height_points: DistributionStats,
}

/// The full `summary.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub extraction_timestamp: String,
    pub parameters: ExtractionParams,
    pub corpus_stats: CorpusStats,
    pub redactions_per_document: DistributionStats,
    pub character_count: CharacterCountStats,
    pub detection_method_breakdown: MethodBreakdown,
    pub leakage_stats: LeakageStats,
    pub multiline_stats: MultilineStats,
    pub size_stats: SizeStats,
}

/// Compute the aggregate summary for a corpus.
pub fn build_summary(
    corpus: &CorpusResult,
    params: &ExtractionParams,
    timestamp: &str,
) -> RunSummary {
    let redactions: Vec<_> = corpus.redactions().collect();
    let total = redactions.len();

    let per_document: Vec<f64> = corpus
        .documents
        .iter()
        .map(|d| d.total_redactions() as f64)
        .collect();

    let char_counts: Vec<f64> = redactions.iter().map(|r| r.estimated_chars as f64).collect();
    let char_buckets = [
        (0.0, 5.0),
        (5.0, 10.0),
        (10.0, 20.0),
        (20.0, 50.0),
        (50.0, 100.0),
        (100.0, 200.0),
        (200.0, f64::INFINITY),
    ];

    let mut breakdown = MethodBreakdown {
        pdf_structure_only: 0,
        pixel_only: 0,
        both_methods: 0,
    };
    for r in &redactions {
        match r.detection_method {
            DetectionMethod::PdfStructure => breakdown.pdf_structure_only += 1,
            DetectionMethod::Pixel => breakdown.pixel_only += 1,
            DetectionMethod::Both => breakdown.both_methods += 1,
        }
    }

    let ascender_hits = redactions.iter().filter(|r| r.has_ascender_leakage).count();
    let descender_hits = redactions.iter().filter(|r| r.has_descender_leakage).count();

    let multiline: Vec<_> = redactions.iter().filter(|r| r.is_multiline).collect();
    let group_count = multiline
        .iter()
        .filter_map(|r| r.multiline_group_id.as_deref())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let rate = |hits: usize| {
        if total > 0 {
            round4(hits as f64 / total as f64)
        } else {
            0.0
        }
    };

    RunSummary {
        extraction_timestamp: timestamp.to_string(),
        parameters: params.clone(),
        corpus_stats: CorpusStats {
            total_documents: corpus.total_documents(),
            total_pages: corpus.total_pages(),
            total_redactions: total,
            documents_with_errors: corpus.failed_documents().count(),
        },
        redactions_per_document: DistributionStats::from_values(&per_document),
        character_count: CharacterCountStats {
            distribution: DistributionStats::from_values(&char_counts),
            histogram: histogram(&char_counts, &char_buckets),
        },
        detection_method_breakdown: breakdown,
        leakage_stats: LeakageStats {
            ascender_hits,
            descender_hits,
            total_with_leakage: ascender_hits + descender_hits,
            leakage_rate: rate(ascender_hits + descender_hits),
        },
        multiline_stats: MultilineStats {
            total_multiline_redactions: multiline.len(),
            total_multiline_groups: group_count,
            multiline_rate: rate(multiline.len()),
        },
        size_stats: SizeStats {
            width_points: DistributionStats::from_values(
                &redactions.iter().map(|r| r.width_points).collect::<Vec<_>>(),
            ),
            height_points: DistributionStats::from_values(
                &redactions.iter().map(|r| r.height_points).collect::<Vec<_>>(),
            ),
        },
    }
}
