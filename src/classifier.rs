//! Heading classification
//!
//! A candidate line is run through an ordered list of rules and the first
//! rule that assigns a level wins. Explicit labels (appendix, dotted section
//! numbers) come before the size/weight fallback.

use crate::candidates::CandidateLine;
use crate::layout::BBox;
use crate::stats::DocumentStats;
use crate::OutlineOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

static APPENDIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*Appendix\s+[A-Z]").unwrap());
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)*)\s+").unwrap());

/// Outline depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    /// Level for a 1-based depth; anything deeper than 4 is H4
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            _ => HeadingLevel::H4,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingLevel::H1 => write!(f, "H1"),
            HeadingLevel::H2 => write!(f, "H2"),
            HeadingLevel::H3 => write!(f, "H3"),
            HeadingLevel::H4 => write!(f, "H4"),
        }
    }
}

/// A candidate line accepted as a heading
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedHeading {
    pub text: String,
    pub page: u32,
    pub bbox: BBox,
    pub size: i32,
    pub bold: bool,
    pub level: HeadingLevel,
}

impl ClassifiedHeading {
    pub fn new(candidate: CandidateLine, level: HeadingLevel) -> Self {
        Self {
            text: candidate.text,
            page: candidate.page,
            bbox: candidate.bbox,
            size: candidate.size,
            bold: candidate.bold,
            level,
        }
    }

    /// Fragments only merge when this matches exactly
    pub fn style(&self) -> (i32, bool) {
        (self.size, self.bold)
    }
}

/// A single classification rule
pub type Rule = fn(&CandidateLine, &DocumentStats, &OutlineOptions) -> Option<HeadingLevel>;

/// Rules in priority order
pub const RULES: &[(&str, Rule)] = &[
    ("appendix", appendix_rule),
    ("numbered", numbered_rule),
    ("stylistic", stylistic_rule),
];

/// "Appendix B ..." is always a top-level heading
pub fn appendix_rule(
    line: &CandidateLine,
    _stats: &DocumentStats,
    _options: &OutlineOptions,
) -> Option<HeadingLevel> {
    APPENDIX_RE
        .is_match(&line.text)
        .then_some(HeadingLevel::H1)
}

/// "2.3.1 Title" is a heading whose depth is the number of dotted groups
pub fn numbered_rule(
    line: &CandidateLine,
    _stats: &DocumentStats,
    _options: &OutlineOptions,
) -> Option<HeadingLevel> {
    let caps = NUMBERED_RE.captures(&line.text)?;
    let depth = caps.get(1)?.as_str().split('.').count();
    Some(HeadingLevel::from_depth(depth))
}

/// Oversized or bold-and-larger short lines, leveled by size relative to body
pub fn stylistic_rule(
    line: &CandidateLine,
    stats: &DocumentStats,
    options: &OutlineOptions,
) -> Option<HeadingLevel> {
    let body = stats.body_size;
    let stylistic = line.size > body + options.size_margin || (line.bold && line.size > body);
    if !stylistic || line.text.split_whitespace().count() >= options.max_heading_words {
        return None;
    }

    let size = f64::from(line.size);
    let body = f64::from(body);
    let level = if size > body * options.h1_ratio {
        HeadingLevel::H1
    } else if size > body * options.h2_ratio {
        HeadingLevel::H2
    } else {
        HeadingLevel::H3
    };
    Some(level)
}

/// Level for a candidate line, or `None` if it is body text
pub fn classify(
    line: &CandidateLine,
    stats: &DocumentStats,
    options: &OutlineOptions,
) -> Option<HeadingLevel> {
    RULES.iter().find_map(|(_, rule)| rule(line, stats, options))
}

/// Keep the candidates that classify as headings, in input order
pub fn classify_all(
    candidates: Vec<CandidateLine>,
    stats: &DocumentStats,
    options: &OutlineOptions,
) -> Vec<ClassifiedHeading> {
    candidates
        .into_iter()
        .filter_map(|c| classify(&c, stats, options).map(|level| ClassifiedHeading::new(c, level)))
        .collect()
}
