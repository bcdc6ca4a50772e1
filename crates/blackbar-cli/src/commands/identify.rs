//! Identify command: rank candidate strings against a catalogue.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use blackbar::entities::load_candidate_list;
use blackbar::output::read_catalogue;
use blackbar::types::CandidateList;
use blackbar::{IdentifyParams, identify_catalogue, write_candidates_json};

use super::Outcome;

#[derive(Args, Debug)]
pub struct IdentifyArgs {
    /// Path to a catalogue.json produced by `blackbar extract`
    #[arg(long)]
    pub catalogue: PathBuf,

    /// Directory holding the source PDFs (used when catalogue paths are stale)
    #[arg(long)]
    pub pdf_dir: PathBuf,

    /// Output directory for candidates.json and the page-render cache
    #[arg(short, long)]
    pub output: PathBuf,

    /// Curated candidate list file (text, one entry per line, or JSON array);
    /// repeatable
    #[arg(long = "candidates")]
    pub candidates: Vec<PathBuf>,

    /// Scraped candidate list file; entries pass a plausibility filter;
    /// repeatable
    #[arg(long = "scraped-candidates")]
    pub scraped_candidates: Vec<PathBuf>,

    /// Store top N candidates per redaction
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Skip redactions narrower than this (points)
    #[arg(long, default_value_t = 10.0)]
    pub min_width: f64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: IdentifyArgs) -> Result<Outcome> {
    if !args.catalogue.is_file() {
        bail!("catalogue not found: {}", args.catalogue.display());
    }
    if !args.pdf_dir.is_dir() {
        bail!("PDF directory does not exist: {}", args.pdf_dir.display());
    }
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create output directory {}", args.output.display()))?;

    let catalogue = read_catalogue(&args.catalogue)?;
    tracing::info!(
        documents = catalogue.documents.len(),
        redactions = catalogue.redactions().count(),
        "catalogue loaded"
    );

    let mut lists: Vec<CandidateList> = Vec::new();
    for path in &args.candidates {
        let list = load_candidate_list(path, false)?;
        tracing::info!(list = %list.name, entries = list.entries.len(), "candidate list loaded");
        lists.push(list);
    }
    for path in &args.scraped_candidates {
        let list = load_candidate_list(path, true)?;
        tracing::info!(list = %list.name, entries = list.entries.len(), "scraped list loaded");
        lists.push(list);
    }

    let params = IdentifyParams {
        top: args.top,
        min_width: args.min_width,
        ..Default::default()
    };

    let media_dir = args.output.join("media");
    let outcome = identify_catalogue(&catalogue, &args.pdf_dir, &lists, &params, &media_dir)?;

    let out_path = args.output.join("candidates.json");
    write_candidates_json(&outcome.results, &out_path)?;

    tracing::info!(
        processed = outcome.processed,
        fonts_identified = outcome.fonts_identified,
        failed_documents = outcome.failed_documents,
        output = %out_path.display(),
        "identification complete"
    );

    Ok(Outcome::Completed)
}
