//! Corpus orchestration across a worker pool.
//!
//! Documents are the unit of work: a rayon pool processes them
//! independently, sharing only the immutable parameters and the process
//! fonts. A cancellation flag stops the *submission* of further documents;
//! in-flight documents run to completion so nothing is persisted
//! half-analysed, and the partial corpus is marked as such.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::config::ExtractionParams;
use crate::error::{BlackbarError, Result};
use crate::pipeline::process_document;
use crate::types::CorpusResult;

/// Shared cancellation signal, safe to clone across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Recursively collect every `.pdf` under `input_dir`, sorted by path.
pub fn find_pdf_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| BlackbarError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BlackbarError::io(dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                walk(&path, out)?;
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(input_dir, &mut files)?;
    files.sort();
    Ok(files)
}

/// Process every PDF under `input_dir` with a pool of `workers` threads.
///
/// `workers == 0` sizes the pool to the machine. `subset` limits the run to
/// the first N files. Results arrive in completion order; a cancelled run
/// returns the completed documents with `partial` set.
pub fn process_corpus(
    input_dir: &Path,
    image_dir: Option<&Path>,
    params: &ExtractionParams,
    workers: usize,
    subset: Option<usize>,
    cancel: &CancelFlag,
) -> Result<CorpusResult> {
    params.validate()?;

    let mut files = find_pdf_files(input_dir)?;
    if let Some(limit) = subset {
        files.truncate(limit);
    }
    let total = files.len();
    tracing::info!(total, "processing corpus");

    let workers = if workers == 0 { num_cpus::get() } else { workers };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| BlackbarError::Config(format!("cannot build worker pool: {e}")))?;

    let completed = AtomicUsize::new(0);
    let documents: Vec<_> = pool.install(|| {
        files
            .par_iter()
            .filter_map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                let result = process_document(path, params, image_dir);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                match &result.error {
                    None => tracing::info!(
                        doc_id = %result.doc_id,
                        redactions = result.total_redactions(),
                        done,
                        total,
                        "document processed"
                    ),
                    Some(err) => tracing::warn!(
                        doc_id = %result.doc_id,
                        done,
                        total,
                        error = %err,
                        "document failed"
                    ),
                }
                Some(result)
            })
            .collect()
    });

    Ok(CorpusResult {
        partial: cancel.is_cancelled(),
        documents,
    })
}
