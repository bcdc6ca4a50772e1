//! Extract command: process a directory of PDFs into a redaction catalogue.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use blackbar::persist::{flatten_run, open_store};
use blackbar::{CancelFlag, ExtractionParams, process_corpus, write_all_outputs};

use super::Outcome;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Input directory containing PDF files to process
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for catalogue.json, catalogue.csv, summary.json, images/
    #[arg(short, long)]
    pub output: PathBuf,

    /// Pixel darkness threshold (0-255); values below count as redaction ink
    #[arg(short, long, default_value_t = 30)]
    pub threshold: u8,

    /// Minimum width/height ratio for redaction bars
    #[arg(long, default_value_t = 3.0)]
    pub min_aspect_ratio: f64,

    /// Padding in pixels for context crop images
    #[arg(long, default_value_t = 50)]
    pub border_padding: u32,

    /// Number of parallel worker threads (0 = number of CPUs)
    #[arg(short, long, default_value_t = 4)]
    pub workers: usize,

    /// DPI for rendering pages (higher = more accurate but slower)
    #[arg(long, default_value_t = 150)]
    pub dpi: u32,

    /// Minimum area in pixels for redaction detection
    #[arg(long, default_value_t = 500)]
    pub min_area: u32,

    /// Characters of context to extract before/after redactions
    #[arg(long, default_value_t = 200)]
    pub context_chars: usize,

    /// IoU threshold for merging detections from both methods
    #[arg(long, default_value_t = 0.7)]
    pub iou_threshold: f64,

    /// Process only the first N PDFs (for testing)
    #[arg(short, long)]
    pub subset: Option<usize>,

    /// Skip crop-image extraction (faster processing)
    #[arg(long)]
    pub no_images: bool,

    /// Database URL to persist results (file:// staging directory)
    #[arg(long, env = "REDACTION_DB_URL")]
    pub db_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl ExtractArgs {
    fn params(&self) -> ExtractionParams {
        ExtractionParams {
            threshold: self.threshold,
            min_aspect_ratio: self.min_aspect_ratio,
            min_area: self.min_area,
            border_padding: self.border_padding,
            dpi: self.dpi,
            context_chars: self.context_chars,
            iou_threshold: self.iou_threshold,
            ..Default::default()
        }
    }
}

pub fn run(args: ExtractArgs) -> Result<Outcome> {
    if !args.input.is_dir() {
        bail!("input directory does not exist: {}", args.input.display());
    }
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create output directory {}", args.output.display()))?;

    let params = args.params();
    params.validate()?;

    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        threshold = params.threshold,
        min_aspect_ratio = params.min_aspect_ratio,
        dpi = params.dpi,
        workers = args.workers,
        images = !args.no_images,
        "starting extraction"
    );

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, finishing in-flight documents");
            cancel.cancel();
        })
        .context("cannot install interrupt handler")?;
    }

    let started_at = chrono::Local::now().to_rfc3339();
    let image_dir = (!args.no_images).then(|| args.output.clone());
    let corpus = process_corpus(
        &args.input,
        image_dir.as_deref(),
        &params,
        args.workers,
        args.subset,
        &cancel,
    )?;
    let finished_at = chrono::Local::now().to_rfc3339();

    let failed: Vec<&str> = corpus
        .failed_documents()
        .map(|d| d.doc_id.as_str())
        .collect();
    tracing::info!(
        documents = corpus.total_documents(),
        pages = corpus.total_pages(),
        redactions = corpus.total_redactions(),
        failed = failed.len(),
        "processing complete"
    );
    if !failed.is_empty() && args.verbose {
        for doc_id in &failed {
            tracing::info!(%doc_id, "document failed");
        }
    }

    let paths = write_all_outputs(&corpus, &params, &args.output)?;
    tracing::info!(
        catalogue = %paths.catalogue_json.display(),
        csv = %paths.catalogue_csv.display(),
        summary = %paths.summary_json.display(),
        "outputs written"
    );

    // Database persistence runs last: on failure the catalogue files remain
    // the authoritative copy and the error is fatal.
    if let Some(url) = &args.db_url {
        let store = open_store(url)?;
        let payload = flatten_run(&corpus, &params, &started_at, &finished_at);
        store
            .apply(&payload)
            .with_context(|| format!("database write failed for {url}"))?;
        tracing::info!(%url, "run persisted");
    }

    Ok(if corpus.partial {
        Outcome::Interrupted
    } else {
        Outcome::Completed
    })
}
