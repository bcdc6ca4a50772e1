//! Batch candidate identification over a written catalogue.
//!
//! Second pass, run after extraction: walk every redaction in the
//! catalogue, fingerprint the surrounding font, measure the precise gap,
//! re-analyse leakage at high DPI, and rank the candidate pool against it.
//! Each PDF is opened once; text layers are cached per page, and the
//! high-DPI renders go through the content-addressed raster cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::IdentifyParams;
use crate::entities::EntityIndex;
use crate::error::Result;
use crate::fonts::{self, WidthProfile, estimate_rendering_params};
use crate::gap::measure_gap;
use crate::geometry::points_to_pixels;
use crate::leakage::{LeakageReport, analyze_leakage};
use crate::output::Catalogue;
use crate::raster::RasterCache;
use crate::reader;
use crate::score::{
    FontEvidence, ScoreContext, WidthTarget, filter_by_width, predict_gap_type, score_candidates,
};
use crate::types::{CandidateList, Redaction, RedactionCandidates, TextChar, TextSpan};

/// Non-fitting candidates kept per redaction for debugging.
const NEAR_MISS_LIMIT: usize = 5;

/// Result of an identification run.
#[derive(Debug, Clone, Default)]
pub struct IdentifyOutcome {
    pub results: Vec<RedactionCandidates>,
    /// Redactions examined (width cutoff applied).
    pub processed: usize,
    /// Redactions whose font fingerprint succeeded.
    pub fonts_identified: usize,
    /// Documents whose PDF could not be read.
    pub failed_documents: usize,
}

/// Resolve a catalogue file path: as recorded, else by file name under the
/// PDF directory the caller points at.
fn resolve_pdf(file_path: &str, pdf_dir: &Path) -> Option<PathBuf> {
    let recorded = PathBuf::from(file_path);
    if recorded.is_file() {
        return Some(recorded);
    }
    let by_name = pdf_dir.join(recorded.file_name()?);
    by_name.is_file().then_some(by_name)
}

/// Per-page text layers, fetched once per (document, page).
struct PageTextCache<'a> {
    path: &'a Path,
    pages: HashMap<u32, (Vec<TextSpan>, Vec<TextChar>)>,
}

impl<'a> PageTextCache<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            pages: HashMap::new(),
        }
    }

    fn get(&mut self, page_num: u32) -> Result<&(Vec<TextSpan>, Vec<TextChar>)> {
        if !self.pages.contains_key(&page_num) {
            let text = reader::page_text(self.path, page_num - 1)?;
            self.pages.insert(page_num, text);
        }
        Ok(&self.pages[&page_num])
    }
}

/// Build the corpus entity index by reading every document's text layer.
fn build_entity_index(catalogue: &Catalogue, pdf_dir: &Path) -> EntityIndex {
    let mut index = EntityIndex::new();
    for doc in &catalogue.documents {
        if doc.error.is_some() {
            continue;
        }
        let Some(path) = resolve_pdf(&doc.file_path, pdf_dir) else {
            tracing::warn!(doc_id = %doc.doc_id, "PDF not found for entity indexing");
            continue;
        };
        let mut text = String::new();
        for page in &doc.pages {
            match reader::page_text(&path, page.page_num - 1) {
                Ok((spans, _)) => {
                    for span in spans {
                        text.push_str(&span.text);
                        text.push(' ');
                    }
                }
                Err(err) => {
                    tracing::debug!(doc_id = %doc.doc_id, page = page.page_num, %err, "skipping page text");
                }
            }
        }
        index.add_document(&doc.doc_id, &text);
    }
    index
}

/// High-DPI leakage re-analysis through the raster cache. Failures degrade
/// to an empty report: leakage is corroborating evidence, never a blocker.
fn high_dpi_leakage(
    pdf_path: &Path,
    redaction: &Redaction,
    font_size_pt: f64,
    leak_dpi: u32,
    cache: &RasterCache,
) -> LeakageReport {
    let render = || reader::render_page_gray(pdf_path, redaction.page_num, leak_dpi);
    match cache.page_raster(pdf_path, redaction.page_num, leak_dpi, render) {
        Ok(raster) => {
            let bbox_px = points_to_pixels(redaction.bbox_points, leak_dpi);
            let font_size_px = font_size_pt * leak_dpi as f64 / 72.0;
            analyze_leakage(&raster, bbox_px, font_size_px, leak_dpi)
        }
        Err(err) => {
            tracing::debug!(doc_id = %redaction.doc_id, page = redaction.page_num, %err,
                "high-dpi render failed, scoring without leakage");
            LeakageReport::default()
        }
    }
}

/// Identify candidates for one redaction given its page's character data.
fn identify_one(
    redaction: &Redaction,
    chars: &[TextChar],
    pdf_path: &Path,
    pool: &[String],
    index: &EntityIndex,
    params: &IdentifyParams,
    cache: &RasterCache,
) -> RedactionCandidates {
    let bbox = redaction.bbox_points;
    let y_center = (bbox.y0 + bbox.y1) / 2.0;

    let profile = WidthProfile::build(chars, y_center);
    let matched = fonts::best_font(&profile);
    let rendering = matched.map(|m| estimate_rendering_params(&profile, m.font));

    let font_size_pt = profile
        .font_size_pt
        .or(redaction.font_size_nearby)
        .unwrap_or(10.0);

    let gap = measure_gap(chars, bbox);
    let target = match &gap {
        Some(g) => WidthTarget {
            target_pt: g.gap_pt,
            precise: true,
            pad_before: g.pad_before,
            pad_after: g.pad_after,
        },
        None => WidthTarget::from_bar_width(redaction.width_points),
    };

    let evidence = matched.map(|m| FontEvidence {
        profile: &profile,
        font: m.font,
        params: rendering.unwrap_or_default(),
    });
    let width_results = filter_by_width(pool, target, font_size_pt, evidence.as_ref());

    let leakage = high_dpi_leakage(pdf_path, redaction, font_size_pt, params.leak_dpi, cache);
    let predictions = predict_gap_type(&redaction.text_before, &redaction.text_after);

    let ctx = ScoreContext {
        predictions: &predictions,
        leakage: &leakage,
        index,
        doc_id: &redaction.doc_id,
        weights: params.weights,
    };
    let scored = score_candidates(width_results, &ctx);

    let mut candidates = Vec::new();
    let mut near_misses = Vec::new();
    for score in scored {
        if score.width_fit > 0.0 {
            if candidates.len() < params.top {
                candidates.push(score);
            }
        } else if near_misses.len() < NEAR_MISS_LIMIT {
            near_misses.push(score);
        }
    }

    RedactionCandidates {
        doc_id: redaction.doc_id.clone(),
        page_num: redaction.page_num,
        redaction_index: redaction.redaction_index,
        font_name: matched.map(|m| m.font.name.clone()),
        font_rmse: matched.map(|m| m.rmse),
        gap_pt: gap.map(|g| g.gap_pt),
        candidates,
        near_misses,
    }
}

/// Run identification across a catalogue.
pub fn identify_catalogue(
    catalogue: &Catalogue,
    pdf_dir: &Path,
    lists: &[CandidateList],
    params: &IdentifyParams,
    media_dir: &Path,
) -> Result<IdentifyOutcome> {
    let index = build_entity_index(catalogue, pdf_dir);

    // Candidate pool: every list entry plus every corpus entity, deduplicated.
    let mut pool: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for list in lists {
        for entry in &list.entries {
            if seen.insert(entry.clone()) {
                pool.push(entry.clone());
            }
        }
    }
    for text in index.entity_texts() {
        if seen.insert(text.to_string()) {
            pool.push(text.to_string());
        }
    }
    tracing::info!(pool = pool.len(), "candidate pool assembled");

    let cache = RasterCache::new(media_dir);
    let mut outcome = IdentifyOutcome::default();

    for doc in &catalogue.documents {
        if doc.error.is_some() {
            continue;
        }
        let Some(path) = resolve_pdf(&doc.file_path, pdf_dir) else {
            tracing::warn!(doc_id = %doc.doc_id, file = %doc.file_path, "PDF not found");
            outcome.failed_documents += 1;
            continue;
        };

        let mut text_cache = PageTextCache::new(&path);
        for page in &doc.pages {
            for redaction in &page.redactions {
                if redaction.width_points < params.min_width {
                    continue;
                }
                let chars = match text_cache.get(redaction.page_num) {
                    Ok((_, chars)) => chars.clone(),
                    Err(err) => {
                        tracing::warn!(doc_id = %doc.doc_id, page = redaction.page_num, %err,
                            "cannot read page text");
                        continue;
                    }
                };

                let result =
                    identify_one(redaction, &chars, &path, &pool, &index, params, &cache);
                outcome.processed += 1;
                if result.font_name.is_some() {
                    outcome.fonts_identified += 1;
                }
                outcome.results.push(result);
            }
        }
        tracing::info!(doc_id = %doc.doc_id, "document identified");
    }

    Ok(outcome)
}
