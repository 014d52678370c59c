//! Heuristic PDF outline extraction using lopdf
//!
//! This crate provides:
//! - Layout extraction (lines of styled spans with bounding boxes)
//! - Body-text statistics per document
//! - Heading classification by numbering, appendix labels and relative style
//! - Reconstruction of headings wrapped over several lines
//! - Batch conversion of a directory of PDFs to outline JSON files

pub mod batch;
pub mod candidates;
pub mod classifier;
pub mod extractor;
pub mod layout;
pub mod merger;
pub mod outline;
pub mod stats;
pub mod title;
pub mod tounicode;

pub use batch::{run_batch, BatchConfig, BatchSummary};
pub use classifier::{classify, ClassifiedHeading, HeadingLevel};
pub use extractor::{load_document, load_document_mem};
pub use layout::{BBox, Line, Page, PdfDocument, Span};
pub use outline::{OutlineEntry, OutlineResult};
pub use stats::DocumentStats;

use log::debug;
use std::path::Path;

/// Tunable thresholds for outline extraction
#[derive(Debug, Clone)]
pub struct OutlineOptions {
    /// Documents with more pages than this only sample a prefix for statistics
    pub stats_sampling_threshold: usize,
    /// Number of leading pages sampled for long documents
    pub stats_sample_pages: usize,
    /// Longer lines are never candidates
    pub max_line_chars: usize,
    /// Lines whose top lies below this fraction of the page height are footers
    pub footer_ratio: f32,
    /// Points above body size that make a line stylistic on size alone
    pub size_margin: i32,
    /// Stylistic lines need fewer words than this
    pub max_heading_words: usize,
    /// Size ratio over body above which a stylistic heading is H1
    pub h1_ratio: f64,
    /// Size ratio over body above which a stylistic heading is H2
    pub h2_ratio: f64,
    /// Largest vertical gap between fragments of one heading
    pub merge_gap: f32,
    /// Fraction of the first page searched for a fallback title
    pub title_region_ratio: f32,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            stats_sampling_threshold: 10,
            stats_sample_pages: 6,
            max_line_chars: 250,
            footer_ratio: 0.9,
            size_margin: 2,
            max_heading_words: 15,
            h1_ratio: 1.4,
            h2_ratio: 1.15,
            merge_gap: 15.0,
            title_region_ratio: 0.25,
        }
    }
}

/// Extract the outline of a PDF file
pub fn extract_outline<P: AsRef<Path>>(
    path: P,
    options: &OutlineOptions,
) -> Result<OutlineResult, PdfError> {
    let path = path.as_ref();
    let doc = load_document(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(outline_document(&doc, &file_name, options))
}

/// Extract the outline of a PDF held in memory
pub fn extract_outline_mem(
    buffer: &[u8],
    file_name: &str,
    options: &OutlineOptions,
) -> Result<OutlineResult, PdfError> {
    let doc = load_document_mem(buffer)?;
    Ok(outline_document(&doc, file_name, options))
}

/// Run the outline pipeline over an already decoded document
///
/// `file_name` is the last-resort title.
pub fn outline_document(
    doc: &PdfDocument,
    file_name: &str,
    options: &OutlineOptions,
) -> OutlineResult {
    let title = title::resolve_title(doc, file_name, options);
    let stats = stats::analyze(doc, options);

    let candidates = candidates::extract_candidates(doc, options);
    let candidate_count = candidates.len();
    let headings = classifier::classify_all(candidates, &stats, options);
    let heading_count = headings.len();
    let merged = merger::merge_fragments(headings, options);

    debug!(
        "{}: {} candidates, {} headings, {} after merging",
        file_name,
        candidate_count,
        heading_count,
        merged.len()
    );

    OutlineResult {
        title,
        outline: merged.into_iter().map(OutlineEntry::from).collect(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}
