use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Adapter output: the page stream
// ---------------------------------------------------------------------------

/// Axis-aligned box in top-origin page space: `y0` is the distance from the
/// top of the page to the top of the glyph box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }
}

/// A run of text sharing one font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub font_size: f32,
    pub bbox: BBox,
    /// 0-based page index.
    pub page: usize,
}

/// Spans sharing a visual row, ordered left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub spans: Vec<Span>,
}

/// Vertically adjacent rows, ordered top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub rows: Vec<Row>,
}

/// One page of the span stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index.
    pub index: usize,
    pub height: f32,
    pub blocks: Vec<Block>,
}

impl Page {
    /// Iterate every row on the page in reading order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.blocks.iter().flat_map(|b| b.rows.iter())
    }
}

// ---------------------------------------------------------------------------
// Classification model
// ---------------------------------------------------------------------------

/// A row rebuilt from its non-noise spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    /// Largest font size among the kept spans.
    pub font_size: f32,
    /// Top of the first kept span.
    pub y_pos: f32,
    pub page: usize,
}

/// A provisional title made of adjacent same-style lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    /// Average over the constituent lines.
    pub font_size: f32,
    pub score: f32,
    pub lines: Vec<Line>,
    pub page: usize,
}

impl Candidate {
    /// Vertical position of the first constituent line.
    pub fn y_pos(&self) -> f32 {
        self.lines.first().map(|l| l.y_pos).unwrap_or(0.0)
    }
}

/// The resolved document title.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub text: String,
    pub font_size: f32,
    /// Lines of the primary candidate and its related parts, top to bottom;
    /// empty for the fallback title.
    pub lines: Vec<Line>,
    /// `text` split on the title separator.
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = InvalidHeadingLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HeadingLevel::H1),
            2 => Ok(HeadingLevel::H2),
            3 => Ok(HeadingLevel::H3),
            _ => Err(InvalidHeadingLevel),
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_u8())
    }
}

/// Level decided for a heading line. `TitleEquivalent` entries are dropped
/// during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLevel {
    Heading(HeadingLevel),
    TitleEquivalent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

/// Heading entry before cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHeading {
    pub level: DetectedLevel,
    pub text: String,
    pub page: usize,
}

/// Final extraction result, one per document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<Heading>,
}

impl DocumentOutline {
    /// Result recorded for a document that could not be read.
    pub fn unreadable() -> Self {
        DocumentOutline::default()
    }
}

#[derive(Debug, Error)]
#[error("Heading level must be between 1 and 3")]
pub struct InvalidHeadingLevel;
