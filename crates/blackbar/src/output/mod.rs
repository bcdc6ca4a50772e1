//! Catalogue serialisation: nested JSON, flat CSV, and aggregate summary.
//!
//! Re-running extraction on the same input with the same parameters yields
//! byte-identical outputs modulo the timestamps.

mod summary;

pub use summary::{DistributionStats, HistogramBucket, RunSummary, build_summary};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ExtractionParams;
use crate::error::{BlackbarError, Result};
use crate::types::{CorpusResult, PageResult, Redaction, RedactionCandidates};

/// Top-level catalogue document, as written to `catalogue.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    /// ISO-8601 local timestamp of the extraction.
    pub extraction_timestamp: String,
    pub parameters: ExtractionParams,
    pub summary: CatalogueTotals,
    pub documents: Vec<CatalogueDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueTotals {
    pub total_documents: usize,
    pub total_pages: u32,
    pub total_redactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueDocument {
    pub doc_id: String,
    pub file_path: String,
    pub total_pages: u32,
    pub total_redactions: usize,
    pub error: Option<String>,
    pub pages: Vec<CataloguePage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CataloguePage {
    pub page_num: u32,
    pub redaction_count: usize,
    pub error: Option<String>,
    pub redactions: Vec<Redaction>,
}

impl Catalogue {
    /// All redactions across every document, in catalogue order.
    pub fn redactions(&self) -> impl Iterator<Item = &Redaction> {
        self.documents
            .iter()
            .flat_map(|d| d.pages.iter())
            .flat_map(|p| p.redactions.iter())
    }
}

/// Assemble the catalogue structure from a corpus result.
pub fn build_catalogue(
    corpus: &CorpusResult,
    params: &ExtractionParams,
    timestamp: &str,
) -> Catalogue {
    Catalogue {
        extraction_timestamp: timestamp.to_string(),
        parameters: params.clone(),
        summary: CatalogueTotals {
            total_documents: corpus.total_documents(),
            total_pages: corpus.total_pages(),
            total_redactions: corpus.total_redactions(),
        },
        documents: corpus
            .documents
            .iter()
            .map(|doc| CatalogueDocument {
                doc_id: doc.doc_id.clone(),
                file_path: doc.file_path.clone(),
                total_pages: doc.total_pages,
                total_redactions: doc.total_redactions(),
                error: doc.error.clone(),
                pages: doc
                    .pages
                    .iter()
                    .map(|page: &PageResult| CataloguePage {
                        page_num: page.page_num,
                        redaction_count: page.redactions.len(),
                        error: page.error.clone(),
                        redactions: page.redactions.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BlackbarError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| BlackbarError::io(path, e))
}

/// Write `catalogue.json`.
pub fn write_catalogue_json(catalogue: &Catalogue, path: &Path) -> Result<()> {
    write_json(catalogue, path)
}

/// Read a previously written catalogue, for the identification pass.
pub fn read_catalogue(path: &Path) -> Result<Catalogue> {
    let raw = std::fs::read_to_string(path).map_err(|e| BlackbarError::io(path, e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// CSV column order. This is part of the output contract; do not reorder.
const CSV_COLUMNS: &[&str] = &[
    "doc_id",
    "page_num",
    "redaction_index",
    "bbox_x0_points",
    "bbox_y0_points",
    "bbox_x1_points",
    "bbox_y1_points",
    "width_points",
    "height_points",
    "bbox_x0_pixels",
    "bbox_y0_pixels",
    "bbox_x1_pixels",
    "bbox_y1_pixels",
    "width_pixels",
    "height_pixels",
    "detection_method",
    "confidence",
    "estimated_chars",
    "font_size_nearby",
    "avg_char_width",
    "text_before",
    "text_after",
    "has_ascender_leakage",
    "has_descender_leakage",
    "leakage_pixels_top",
    "leakage_pixels_bottom",
    "is_multiline",
    "multiline_group_id",
    "line_index_in_group",
    "image_tight",
    "image_context",
];

fn csv_row(r: &Redaction) -> Vec<String> {
    let opt_f64 = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    let opt_u32 = |v: Option<u32>| v.map(|x| x.to_string()).unwrap_or_default();
    let opt_str = |v: &Option<String>| v.clone().unwrap_or_default();

    vec![
        r.doc_id.clone(),
        r.page_num.to_string(),
        r.redaction_index.to_string(),
        r.bbox_points.x0.to_string(),
        r.bbox_points.y0.to_string(),
        r.bbox_points.x1.to_string(),
        r.bbox_points.y1.to_string(),
        r.width_points.to_string(),
        r.height_points.to_string(),
        r.bbox_pixels.x0.to_string(),
        r.bbox_pixels.y0.to_string(),
        r.bbox_pixels.x1.to_string(),
        r.bbox_pixels.y1.to_string(),
        r.width_pixels.to_string(),
        r.height_pixels.to_string(),
        r.detection_method.to_string(),
        r.confidence.to_string(),
        r.estimated_chars.to_string(),
        opt_f64(r.font_size_nearby),
        opt_f64(r.avg_char_width),
        r.text_before.clone(),
        r.text_after.clone(),
        r.has_ascender_leakage.to_string(),
        r.has_descender_leakage.to_string(),
        r.leakage_pixels_top.to_string(),
        r.leakage_pixels_bottom.to_string(),
        r.is_multiline.to_string(),
        opt_str(&r.multiline_group_id),
        opt_u32(r.line_index_in_group),
        opt_str(&r.image_tight),
        opt_str(&r.image_context),
    ]
}

/// Write `catalogue.csv`: one row per redaction, stable column order.
pub fn write_catalogue_csv(corpus: &CorpusResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BlackbarError::io(parent, e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(BlackbarError::from)?;
    writer.write_record(CSV_COLUMNS)?;
    for redaction in corpus.redactions() {
        writer.write_record(csv_row(redaction))?;
    }
    writer.flush().map_err(|e| BlackbarError::io(path, e))?;
    Ok(())
}

/// Write `summary.json`.
pub fn write_summary_json(
    corpus: &CorpusResult,
    params: &ExtractionParams,
    timestamp: &str,
    path: &Path,
) -> Result<()> {
    write_json(&build_summary(corpus, params, timestamp), path)
}

/// Write `candidates.json` from the identification pass.
pub fn write_candidates_json(candidates: &[RedactionCandidates], path: &Path) -> Result<()> {
    write_json(&candidates, path)
}

/// Paths of the files a full output pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub catalogue_json: PathBuf,
    pub catalogue_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// Write catalogue.json, catalogue.csv, and summary.json under `output_dir`.
pub fn write_all_outputs(
    corpus: &CorpusResult,
    params: &ExtractionParams,
    output_dir: &Path,
) -> Result<OutputPaths> {
    std::fs::create_dir_all(output_dir).map_err(|e| BlackbarError::io(output_dir, e))?;

    let timestamp = chrono::Local::now().to_rfc3339();
    let paths = OutputPaths {
        catalogue_json: output_dir.join("catalogue.json"),
        catalogue_csv: output_dir.join("catalogue.csv"),
        summary_json: output_dir.join("summary.json"),
    };

    let catalogue = build_catalogue(corpus, params, &timestamp);
    write_catalogue_json(&catalogue, &paths.catalogue_json)?;
    write_catalogue_csv(corpus, &paths.catalogue_csv)?;
    write_summary_json(corpus, params, &timestamp, &paths.summary_json)?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelRect, PointRect};
    use crate::types::{DetectionMethod, DocumentResult};

    fn corpus() -> CorpusResult {
        let mut r = Redaction::new(
            "doc-1",
            1,
            0,
            PointRect::new(100.0, 300.0, 200.0, 312.0),
            PixelRect::new(208, 625, 417, 650),
            DetectionMethod::Both,
            0.97,
        );
        r.estimated_chars = 17;
        r.text_before = "Mr.".into();

        CorpusResult {
            documents: vec![
                DocumentResult {
                    doc_id: "doc-1".into(),
                    file_path: "in/doc-1.pdf".into(),
                    total_pages: 1,
                    pages: vec![PageResult::ok(1, vec![r])],
                    error: None,
                },
                DocumentResult::failed("doc-2", "in/doc-2.pdf", "cannot open"),
            ],
            partial: false,
        }
    }

    #[test]
    fn catalogue_totals_and_nesting() {
        let catalogue = build_catalogue(&corpus(), &ExtractionParams::default(), "t0");
        assert_eq!(catalogue.summary.total_documents, 2);
        assert_eq!(catalogue.summary.total_redactions, 1);
        assert_eq!(catalogue.documents[0].pages[0].redaction_count, 1);
        // Failed documents keep their row with empty pages.
        assert_eq!(catalogue.documents[1].error.as_deref(), Some("cannot open"));
        assert!(catalogue.documents[1].pages.is_empty());
    }

    #[test]
    fn catalogue_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.json");
        let catalogue = build_catalogue(&corpus(), &ExtractionParams::default(), "t0");
        write_catalogue_json(&catalogue, &path).unwrap();
        let back = read_catalogue(&path).unwrap();
        assert_eq!(catalogue, back);
    }

    #[test]
    fn rerun_with_same_timestamp_is_byte_identical() {
        let params = ExtractionParams::default();
        let a = serde_json::to_string(&build_catalogue(&corpus(), &params, "t0")).unwrap();
        let b = serde_json::to_string(&build_catalogue(&corpus(), &params, "t0")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn csv_has_header_and_one_row_per_redaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.csv");
        write_catalogue_csv(&corpus(), &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("doc_id,page_num,redaction_index,bbox_x0_points"));
        assert!(lines[0].ends_with("image_tight,image_context"));
        assert!(lines[1].starts_with("doc-1,1,0,100,300,200,312,100,12,208,625,417,650,"));
    }

    #[test]
    fn empty_corpus_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.csv");
        write_catalogue_csv(&CorpusResult::default(), &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert_eq!(raw.lines().next().unwrap().split(',').count(), CSV_COLUMNS.len());
    }

    #[test]
    fn write_all_creates_the_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all_outputs(&corpus(), &ExtractionParams::default(), dir.path()).unwrap();
        assert!(paths.catalogue_json.is_file());
        assert!(paths.catalogue_csv.is_file());
        assert!(paths.summary_json.is_file());
    }
}
