//! Directory batch conversion
//!
//! Every `*.pdf` in the input directory becomes `<stem>.json` in the output
//! directory. Documents are independent, so they are processed in parallel,
//! and a failing document is logged and skipped.

use crate::{extract_outline, OutlineOptions, PdfError};
use log::{error, info};
use rayon::prelude::*;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Where to read PDFs from and write outlines to
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub options: OutlineOptions,
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            options: OutlineOptions::default(),
        }
    }
}

/// Per-run counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// `<input>/pdfs` when it exists, else `<input>`
pub fn source_dir(input_dir: &Path) -> PathBuf {
    let nested = input_dir.join("pdfs");
    if nested.is_dir() {
        nested
    } else {
        input_dir.to_path_buf()
    }
}

/// PDF files directly inside `dir`, sorted by name
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for an input PDF: same stem, `.json` extension
pub fn output_path(pdf: &Path, output_dir: &Path) -> PathBuf {
    let mut name = pdf.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".json");
    output_dir.join(name)
}

/// Extract one document's outline and write its JSON file
pub fn process_file(
    pdf: &Path,
    output_dir: &Path,
    options: &OutlineOptions,
) -> Result<PathBuf, PdfError> {
    let result = extract_outline(pdf, options)?;
    let out = output_path(pdf, output_dir);
    fs::write(&out, result.to_json()?)?;
    Ok(out)
}

/// Run one file's work, turning a panic inside the decoder into an error
fn isolated<F>(work: F) -> Result<PathBuf, PdfError>
where
    F: FnOnce() -> Result<PathBuf, PdfError>,
{
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(PdfError::Parse(format!("decoder panicked: {}", msg)))
    })
}

/// Convert every PDF in the configured input directory
///
/// Only a missing/unreadable input directory or an uncreatable output
/// directory is an error; per-file failures are counted in the summary.
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary, PdfError> {
    let source = source_dir(&config.input_dir);
    fs::create_dir_all(&config.output_dir)?;

    let files = discover_pdfs(&source)?;
    info!("found {} PDF files in {}", files.len(), source.display());

    let outcomes: Vec<bool> = files
        .par_iter()
        .map(|pdf| {
            info!("processing {}", pdf.display());
            match isolated(|| process_file(pdf, &config.output_dir, &config.options)) {
                Ok(out) => {
                    info!("wrote outline to {}", out.display());
                    true
                }
                Err(e) => {
                    error!("skipping {}: {}", pdf.display(), e);
                    false
                }
            }
        })
        .collect();

    let processed = outcomes.iter().filter(|ok| **ok).count();
    Ok(BatchSummary {
        processed,
        failed: outcomes.len() - processed,
    })
}
