//! Candidate line extraction
//!
//! Flattens every page's lines into records carrying the text, position and
//! the style of the line's first span. Footer-zone lines and bare page
//! numbers are dropped here so the classifier never sees them.

use crate::layout::{BBox, Line, Page, PdfDocument};
use crate::stats::round_size;
use crate::OutlineOptions;
use once_cell::sync::Lazy;
use regex::Regex;

static PAGE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*$").unwrap());

/// A text line that may turn out to be a heading
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLine {
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    pub bbox: BBox,
    /// Rounded size of the first span
    pub size: i32,
    /// Whether the first span's font is bold
    pub bold: bool,
}

/// Collect candidate lines in page-then-stream order
pub fn extract_candidates(doc: &PdfDocument, options: &OutlineOptions) -> Vec<CandidateLine> {
    doc.pages
        .iter()
        .enumerate()
        .flat_map(|(idx, page)| {
            page.lines
                .iter()
                .filter_map(move |line| candidate_from_line(line, page, idx as u32 + 1, options))
        })
        .collect()
}

fn candidate_from_line(
    line: &Line,
    page: &Page,
    page_num: u32,
    options: &OutlineOptions,
) -> Option<CandidateLine> {
    let first = line.spans.first()?;

    let text = line.text().trim().to_string();
    if text.is_empty() || text.chars().count() > options.max_line_chars {
        return None;
    }

    if line.bbox.top > page.height * options.footer_ratio || is_page_number(&text) {
        return None;
    }

    Some(CandidateLine {
        text,
        page: page_num,
        bbox: line.bbox,
        size: round_size(first.font_size),
        bold: first.is_bold(),
    })
}

/// A line consisting of nothing but a number
pub fn is_page_number(text: &str) -> bool {
    PAGE_NUMBER_RE.is_match(text)
}
