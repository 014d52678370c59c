//! Layout extraction from PDF using lopdf
//!
//! Interprets each page's content stream to recover styled text spans with
//! page-space bounding boxes, then groups them into visual lines.

use crate::layout::{BBox, Line, Page, PdfDocument, Span};
use crate::tounicode::{is_composite_font, ToUnicodeCMap};
use crate::PdfError;
use log::{debug, warn};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// US Letter, used when a page has no MediaBox anywhere in its tree
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Glyph extents above/below the baseline as a fraction of font size
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Average glyph advance as a fraction of font size (no glyph widths are read)
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Spans whose baselines differ by less than this share a line
const Y_TOLERANCE: f32 = 3.0;

/// TJ adjustments more negative than this (thousandths of an em) are word gaps
const TJ_SPACE_THRESHOLD: f32 = -250.0;

/// Gap between same-style spans, as a fraction of font size, that still
/// counts as touching
const MIN_WORD_GAP_RATIO: f32 = 0.1;

/// Decode a PDF file into the layout model
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<PdfDocument, PdfError> {
    let doc = Document::load(path)?;
    Ok(decode_document(&doc))
}

/// Decode a PDF held in memory
pub fn load_document_mem(buffer: &[u8]) -> Result<PdfDocument, PdfError> {
    let doc = Document::load_mem(buffer)?;
    Ok(decode_document(&doc))
}

/// Build the layout model from a loaded document.
///
/// A page whose content cannot be decoded is kept, empty, so page numbers
/// still line up with the source document.
pub fn decode_document(doc: &Document) -> PdfDocument {
    let pages = doc.get_pages();
    let mut out = Vec::with_capacity(pages.len());

    for (page_num, &page_id) in pages.iter() {
        let page_box = page_box(doc, page_id);
        let spans = match extract_page_spans(doc, page_id, &page_box) {
            Ok(spans) => spans,
            Err(e) => {
                warn!("page {}: skipping undecodable content: {}", page_num, e);
                Vec::new()
            }
        };

        out.push(Page {
            width: page_box[2] - page_box[0],
            height: page_box[3] - page_box[1],
            lines: group_into_lines(spans),
        });
    }

    debug!("decoded {} pages", out.len());

    PdfDocument {
        pages: out,
        title: get_document_title(doc),
    }
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// A font resource as seen from one page
struct PageFont<'a> {
    dict: &'a Dictionary,
    family: String,
    composite: bool,
    cmap: Option<ToUnicodeCMap>,
}

fn load_page_fonts<'a>(
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
) -> HashMap<Vec<u8>, PageFont<'a>> {
    fonts
        .into_iter()
        .map(|(name, dict)| {
            let family = font_family(dict).unwrap_or_else(|| String::from_utf8_lossy(&name).into());
            let composite = is_composite_font(dict);
            let cmap = if composite {
                ToUnicodeCMap::from_font(doc, dict)
            } else {
                None
            };
            (
                name,
                PageFont {
                    dict,
                    family,
                    composite,
                    cmap,
                },
            )
        })
        .collect()
}

/// BaseFont with any subset tag ("ABCDEF+") removed
fn font_family(dict: &Dictionary) -> Option<String> {
    let name = dict.get(b"BaseFont").ok()?.as_name().ok()?;
    let name = String::from_utf8_lossy(name);
    let name = match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name.as_ref(),
    };
    Some(name.to_string())
}

/// Text and graphics state while walking a content stream
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    in_text_block: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            ctm_stack: Vec::new(),
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            text_matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            line_matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            in_text_block: false,
        }
    }
}

impl TextState {
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let shifted = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.line_matrix = shifted;
        self.text_matrix = shifted;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.translate_line(0.0, -leading);
    }

    /// Move the pen along the baseline after showing `text`
    fn advance(&mut self, text: &str) {
        let tx = text.chars().count() as f32 * self.font_size * APPROX_CHAR_WIDTH_RATIO;
        self.text_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.text_matrix);
    }
}

/// Extract styled spans from a single page in content-stream order
fn extract_page_spans(
    doc: &Document,
    page_id: ObjectId,
    page_box: &[f32; 4],
) -> Result<Vec<Span>, PdfError> {
    use lopdf::content::Content;

    let fonts = load_page_fonts(doc, doc.get_page_fonts(page_id).unwrap_or_default());

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut state = TextState::default();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    state.ctm = multiply_matrices(&m, &state.ctm);
                }
            }
            "BT" => {
                state.in_text_block = true;
                state.text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                state.line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => state.in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        state.font = name.to_vec();
                    }
                    if let Some(size) = get_number(&operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    state.next_line();
                }
                // `"` carries word and char spacing before the string
                let string_operand = if op.operator == "\"" {
                    operands.get(2)
                } else {
                    operands.first()
                };
                if state.in_text_block {
                    if let Some(text) = string_operand
                        .and_then(|o| decode_operand(o, doc, fonts.get(&state.font)))
                    {
                        emit_span(&mut spans, &mut state, &fonts, text, page_box);
                    }
                }
            }
            "TJ" => {
                if state.in_text_block {
                    if let Some(Ok(array)) = operands.first().map(|o| o.as_array()) {
                        let font = fonts.get(&state.font);
                        let mut combined_text = String::new();
                        for item in array {
                            if let Some(text) = decode_operand(item, doc, font) {
                                combined_text.push_str(&text);
                            } else if let Some(adjust) = get_number(item) {
                                if adjust < TJ_SPACE_THRESHOLD && !combined_text.ends_with(' ') {
                                    combined_text.push(' ');
                                }
                            }
                        }
                        emit_span(&mut spans, &mut state, &fonts, combined_text, page_box);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Record a shown string as a span in top-left page coordinates
fn emit_span(
    spans: &mut Vec<Span>,
    state: &mut TextState,
    fonts: &HashMap<Vec<u8>, PageFont<'_>>,
    text: String,
    page_box: &[f32; 4],
) {
    if text.trim().is_empty() {
        state.advance(&text);
        return;
    }

    let combined = multiply_matrices(&state.text_matrix, &state.ctm);
    let size = effective_font_size(state.font_size, &combined);
    let (x, y) = (combined[4], combined[5]);
    let width = text.chars().count() as f32 * size * APPROX_CHAR_WIDTH_RATIO;

    let left = x - page_box[0];
    let baseline = page_box[3] - y;

    let font = fonts
        .get(&state.font)
        .map(|f| f.family.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(&state.font).into());

    state.advance(&text);
    spans.push(Span {
        text,
        font_size: size,
        font,
        bbox: BBox::new(left, baseline - ASCENT * size, left + width, baseline + DESCENT * size),
    });
}

fn matrix_operands(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand).unwrap_or(m[i]);
    }
    Some(m)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and a text-to-page matrix
fn effective_font_size(base_size: f32, matrix: &[f32; 6]) -> f32 {
    let scale_x = (matrix[0].powi(2) + matrix[1].powi(2)).sqrt();
    let scale_y = (matrix[2].powi(2) + matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a string operand using the current font
fn decode_operand(obj: &Object, doc: &Document, font: Option<&PageFont<'_>>) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font) = font {
        if font.composite {
            if let Some(cmap) = &font.cmap {
                return Some(cmap.decode_cids(bytes));
            }
        }
        if let Ok(encoding) = font.dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    Some(decode_fallback(bytes))
}

/// UTF-16BE when a BOM is present, Latin-1 otherwise
fn decode_fallback(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Visible area of a page: the CropBox clipped to the MediaBox, or the
/// MediaBox alone. Both are inherited from the page tree when absent.
fn page_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let media_box = inherited_rect(doc, page_id, b"MediaBox").unwrap_or(DEFAULT_MEDIA_BOX);
    inherited_rect(doc, page_id, b"CropBox")
        .and_then(|crop| clip_rect(&crop, &media_box))
        .unwrap_or(media_box)
}

fn inherited_rect(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let mut node = Some(page_id);
    // Bounded walk; malformed trees can contain Parent cycles
    for _ in 0..32 {
        let id = node?;
        let dict = doc.get_dictionary(id).ok()?;
        if let Some(rect) = dict.get(key).ok().and_then(|o| resolve_rect(doc, o)) {
            return Some(rect);
        }
        node = dict.get(b"Parent").and_then(|o| o.as_reference()).ok();
    }
    None
}

/// Intersection of two normalized rectangles, if it has any area
fn clip_rect(a: &[f32; 4], b: &[f32; 4]) -> Option<[f32; 4]> {
    let rect = [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])];
    (rect[2] > rect[0] && rect[3] > rect[1]).then_some(rect)
}

/// Normalize a rectangle array to [x0, y0, x1, y1] with x0 <= x1, y0 <= y1
fn resolve_rect(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let array = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        other => other.as_array().ok()?,
    };
    if array.len() != 4 {
        return None;
    }
    let v: Vec<f32> = array.iter().filter_map(get_number).collect();
    if v.len() != 4 {
        return None;
    }
    let rect = [v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])];
    if rect[2] - rect[0] <= 0.0 || rect[3] - rect[1] <= 0.0 {
        return None;
    }
    Some(rect)
}

/// Get document title from Info dictionary
fn get_document_title(doc: &Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    match info.get(b"Title").ok()? {
        Object::String(bytes, _) => Some(decode_fallback(bytes)),
        _ => None,
    }
}

/// Group spans into lines.
///
/// Preserves content-stream order, which is usually reading order, and only
/// joins consecutive spans whose baselines agree within [`Y_TOLERANCE`].
pub fn group_into_lines(spans: Vec<Span>) -> Vec<Line> {
    let mut groups: Vec<Vec<Span>> = Vec::new();

    for span in spans {
        let same_line = groups
            .last()
            .and_then(|g| g.last())
            .is_some_and(|last| (baseline(last) - baseline(&span)).abs() < Y_TOLERANCE);

        match groups.last_mut() {
            Some(group) if same_line => group.push(span),
            _ => groups.push(vec![span]),
        }
    }

    groups.into_iter().map(assemble_line).collect()
}

fn baseline(span: &Span) -> f32 {
    span.bbox.bottom - DESCENT * span.font_size
}

/// Sort a line's spans left to right and coalesce touching same-style runs
fn assemble_line(mut spans: Vec<Span>) -> Line {
    spans.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let same_style =
                prev.font == span.font && (prev.font_size - span.font_size).abs() < 0.5;
            let gap = span.bbox.left - prev.bbox.right;
            if same_style && gap < prev.font_size * 2.0 {
                if gap >= prev.font_size * MIN_WORD_GAP_RATIO
                    && !prev.text.ends_with(' ')
                    && !span.text.starts_with(' ')
                {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.bbox = prev.bbox.union(&span.bbox);
                continue;
            }
        }
        merged.push(span);
    }

    Line::from_spans(merged)
}
