//! Document title resolution

use crate::layout::{BBox, PdfDocument};
use crate::OutlineOptions;

/// Title from metadata, else the top of the first page, else the file name
pub fn resolve_title(doc: &PdfDocument, file_name: &str, options: &OutlineOptions) -> String {
    if let Some(title) = doc.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    if let Some(title) = first_page_title(doc, options.title_region_ratio) {
        return title;
    }

    if file_name.is_empty() {
        "Untitled".to_string()
    } else {
        file_name.to_string()
    }
}

/// Whitespace-normalized text from the top `ratio` of page one
fn first_page_title(doc: &PdfDocument, ratio: f32) -> Option<String> {
    let page = doc.pages.first()?;
    let region = BBox::new(0.0, 0.0, page.width, page.height * ratio);
    let text = normalize_whitespace(&page.text_in_rect(&region));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
