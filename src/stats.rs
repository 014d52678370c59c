//! Document-wide typographic baselines
//!
//! The body font size and family are the most frequent values over every span
//! of a bounded page prefix. Headings are judged relative to them.

use crate::layout::PdfDocument;
use crate::OutlineOptions;
use indexmap::IndexMap;
use log::debug;
use std::hash::Hash;

/// Body size used when the document has no text at all
pub const DEFAULT_BODY_SIZE: i32 = 10;
/// Body family used when the document has no text at all
pub const DEFAULT_BODY_FONT: &str = "Times";

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    /// Most frequent rounded font size
    pub body_size: i32,
    /// Most frequent font family
    pub body_font: String,
}

impl Default for DocumentStats {
    fn default() -> Self {
        Self {
            body_size: DEFAULT_BODY_SIZE,
            body_font: DEFAULT_BODY_FONT.to_string(),
        }
    }
}

/// Round a font size to the nearest integer, ties to even.
///
/// Both statistics and candidate lines go through this so their sizes are
/// directly comparable.
pub fn round_size(size: f32) -> i32 {
    size.round_ties_even() as i32
}

/// Compute body size and family for a document
pub fn analyze(doc: &PdfDocument, options: &OutlineOptions) -> DocumentStats {
    let sampled = if doc.page_count() > options.stats_sampling_threshold {
        options.stats_sample_pages
    } else {
        doc.page_count()
    };

    let mut sizes: IndexMap<i32, usize> = IndexMap::new();
    let mut fonts: IndexMap<&str, usize> = IndexMap::new();

    for page in doc.pages.iter().take(sampled) {
        for span in page.spans() {
            *sizes.entry(round_size(span.font_size)).or_insert(0) += 1;
            *fonts.entry(span.font.as_str()).or_insert(0) += 1;
        }
    }

    let defaults = DocumentStats::default();
    let stats = DocumentStats {
        body_size: most_common(&sizes).copied().unwrap_or(defaults.body_size),
        body_font: most_common(&fonts)
            .map(|f| f.to_string())
            .unwrap_or(defaults.body_font),
    };

    debug!(
        "body size {} / font {:?} from {} of {} pages ({} distinct sizes)",
        stats.body_size,
        stats.body_font,
        sampled,
        doc.page_count(),
        sizes.len()
    );

    stats
}

/// Key with the highest count; the earliest inserted key wins ties
fn most_common<K: Hash + Eq>(counts: &IndexMap<K, usize>) -> Option<&K> {
    let mut best: Option<(&K, usize)> = None;
    for (key, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(k, _)| k)
}
