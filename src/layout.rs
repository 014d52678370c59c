//! Page layout model produced by the decoder
//!
//! Coordinates use a top-left origin with y growing downward, so `top` is
//! always less than or equal to `bottom`.

/// An axis-aligned box in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// A styled run of text
#[derive(Debug, Clone)]
pub struct Span {
    pub text: String,
    /// Rendered font size in points
    pub font_size: f32,
    /// Font family, e.g. "Arial-BoldMT"
    pub font: String,
    pub bbox: BBox,
}

impl Span {
    pub fn is_bold(&self) -> bool {
        is_bold_font(&self.font)
    }
}

/// Whether a font family name carries a bold weight marker
pub fn is_bold_font(font: &str) -> bool {
    font.to_lowercase().contains("bold")
}

/// Spans sharing one visual text line
#[derive(Debug, Clone)]
pub struct Line {
    pub spans: Vec<Span>,
    pub bbox: BBox,
}

impl Line {
    /// Build a line whose bbox is the union of its span boxes
    pub fn from_spans(spans: Vec<Span>) -> Self {
        let bbox = spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();
        Self { spans, bbox }
    }

    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub lines: Vec<Line>,
}

impl Page {
    /// Plain text of every span touching `rect`, one output line per layout line
    pub fn text_in_rect(&self, rect: &BBox) -> String {
        self.lines
            .iter()
            .filter_map(|line| {
                let parts: Vec<&str> = line
                    .spans
                    .iter()
                    .filter(|s| s.bbox.intersects(rect))
                    .map(|s| s.text.as_str())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|l| l.spans.iter())
    }
}

/// A decoded document
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pub pages: Vec<Page>,
    /// `/Title` from the document information dictionary
    pub title: Option<String>,
}

impl PdfDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
