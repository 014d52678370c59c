//! ToUnicode CMap parsing for composite font text
//!
//! Type0 fonts usually show 2-byte CIDs that lopdf's simple encodings cannot
//! decode; the font's ToUnicode stream maps them back to Unicode.

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;
use std::io::Read;

/// A parsed ToUnicode CMap mapping CIDs to Unicode strings
#[derive(Debug, Default, Clone)]
pub struct ToUnicodeCMap {
    /// Direct character mappings (CID -> Unicode string)
    pub char_map: HashMap<u16, String>,
    /// Range mappings (start_cid, end_cid, base codepoint)
    pub ranges: Vec<(u16, u16, u32)>,
}

impl ToUnicodeCMap {
    /// Parse a ToUnicode CMap from its decompressed content
    pub fn parse(content: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(content);
        let mut cmap = ToUnicodeCMap::default();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            let tokens = tokenize(section);
            for pair in tokens.chunks_exact(2) {
                if let (Token::Hex(src), Token::Hex(dst)) = (&pair[0], &pair[1]) {
                    if let (Some(cid), Some(s)) = (parse_hex_u16(src), hex_to_unicode_string(dst)) {
                        cmap.char_map.insert(cid, s);
                    }
                }
            }
        }

        for section in sections(&text, "beginbfrange", "endbfrange") {
            let tokens = tokenize(section);
            for triple in tokens.chunks_exact(3) {
                let (Token::Hex(start), Token::Hex(end)) = (&triple[0], &triple[1]) else {
                    continue;
                };
                let (Some(start), Some(end)) = (parse_hex_u16(start), parse_hex_u16(end)) else {
                    continue;
                };
                match &triple[2] {
                    Token::Hex(base) => {
                        if let Some(base) = parse_hex_u32(base) {
                            cmap.ranges.push((start, end, base));
                        }
                    }
                    // [<dst1> <dst2> ...] maps each CID in the range individually
                    Token::Array(items) => {
                        for (cid, dst) in (start..=end).zip(items) {
                            if let Some(s) = hex_to_unicode_string(dst) {
                                cmap.char_map.insert(cid, s);
                            }
                        }
                    }
                }
            }
        }

        if cmap.char_map.is_empty() && cmap.ranges.is_empty() {
            None
        } else {
            Some(cmap)
        }
    }

    /// Load the ToUnicode CMap referenced by a font dictionary
    pub fn from_font(doc: &Document, font: &Dictionary) -> Option<Self> {
        let stream = match font.get(b"ToUnicode").ok()? {
            Object::Reference(id) => doc.get_object(*id).ok()?.as_stream().ok()?,
            Object::Stream(stream) => stream,
            _ => return None,
        };

        let content = match stream.decompressed_content() {
            Ok(data) => data,
            Err(_) => inflate(&stream.content).unwrap_or_else(|| stream.content.clone()),
        };

        Self::parse(&content)
    }

    /// Look up a CID and return the Unicode string
    pub fn lookup(&self, cid: u16) -> Option<String> {
        if let Some(s) = self.char_map.get(&cid) {
            return Some(s.clone());
        }

        self.ranges
            .iter()
            .find(|&&(start, end, _)| cid >= start && cid <= end)
            .and_then(|&(start, _, base)| base.checked_add(u32::from(cid - start)))
            .and_then(char::from_u32)
            .map(|c| c.to_string())
    }

    /// Decode a byte slice of big-endian 2-byte CIDs
    pub fn decode_cids(&self, bytes: &[u8]) -> String {
        let mut result = String::new();

        for chunk in bytes.chunks_exact(2) {
            let cid = u16::from_be_bytes([chunk[0], chunk[1]]);
            match self.lookup(cid) {
                Some(s) => result.push_str(&s),
                None => {
                    if let Some(c) = char::from_u32(cid as u32) {
                        result.push(c);
                    }
                }
            }
        }

        result
    }
}

/// Whether a font dictionary describes a composite (Type0) font
pub fn is_composite_font(font: &Dictionary) -> bool {
    matches!(font.get(b"Subtype").and_then(|o| o.as_name()), Ok(b"Type0"))
}

/// Some producers write streams whose /Filter lopdf rejects; try raw zlib.
fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    Some(out)
}

#[derive(Debug)]
enum Token {
    Hex(String),
    Array(Vec<String>),
}

/// Bodies between every `begin`/`end` keyword pair
fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = text[pos..].find(begin) {
        let body_start = pos + start + begin.len();
        let Some(len) = text[body_start..].find(end) else {
            break;
        };
        out.push(&text[body_start..body_start + len]);
        pos = body_start + len + end.len();
    }
    out
}

/// Split a CMap section into `<hex>` and `[<hex> ...]` tokens
fn tokenize(section: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = section.chars();
    let mut array: Option<Vec<String>> = None;

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let hex: String = chars.by_ref().take_while(|&c| c != '>').collect();
                match array.as_mut() {
                    Some(items) => items.push(hex),
                    None => tokens.push(Token::Hex(hex)),
                }
            }
            '[' => array = Some(Vec::new()),
            ']' => {
                if let Some(items) = array.take() {
                    tokens.push(Token::Array(items));
                }
            }
            _ => {}
        }
    }

    tokens
}

fn parse_hex_u16(hex: &str) -> Option<u16> {
    u16::from_str_radix(hex.trim(), 16).ok()
}

fn parse_hex_u32(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex.trim(), 16).ok()
}

/// Convert UTF-16BE hex digits to a string, surrogate pairs included
fn hex_to_unicode_string(hex: &str) -> Option<String> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let units: Vec<u16> = hex
        .as_bytes()
        .chunks(4)
        .filter(|chunk| chunk.len() == 4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u16::from_str_radix(s, 16).ok())
        .collect();

    let result = String::from_utf16_lossy(&units);
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}
