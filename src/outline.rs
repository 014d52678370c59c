//! Outline result and its JSON form

use crate::classifier::{ClassifiedHeading, HeadingLevel};
use crate::PdfError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// One heading in the final outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
}

impl From<ClassifiedHeading> for OutlineEntry {
    fn from(h: ClassifiedHeading) -> Self {
        Self {
            level: h.level,
            text: h.text,
            page: h.page,
        }
    }
}

/// Title plus ordered headings for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineResult {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl OutlineResult {
    /// Four-space indented JSON; non-ASCII text is written as-is
    pub fn to_json(&self) -> Result<String, PdfError> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
