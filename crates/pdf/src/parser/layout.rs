//! Text extraction, row grouping, and block assembly.
//!
//! This module turns raw PDF content-stream operators into the page stream
//! consumed by `outline_core`. All I/O lives behind the [`PdfBackend`]
//! trait provided by the caller.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  RawSpan[]  ->  TextRow[]  ->  TextBlock[]  ->  outline_core::Page
//!   (per page)      extract        group_spans    group_rows       to_page
//! ```
//!
//! Spans are extracted in PDF user space (baseline y, growing upward) and
//! only converted to top-origin page space in [`to_page`].

use std::collections::HashMap;

use outline_core::{BBox, Block, Page, Row, Span, FONT_SIZE_BUCKET};

use super::backend::{
    get_number_from_value, BackendFontInfo, PageBox, PageId, PdfBackend, PdfValue,
};
use super::cleanup::cleanup_span_text;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A run of text shown by a single text operator.
#[derive(Debug, Clone)]
pub struct RawSpan {
    pub text: String,
    pub x: f32,
    /// Baseline in user space.
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// Spans sharing (approximately) one baseline, left to right.
#[derive(Debug, Clone, Default)]
pub struct TextRow {
    pub spans: Vec<RawSpan>,
    pub y: f32,
    pub x: f32,
    pub font_size: f32,
}

/// Vertically adjacent rows.
#[derive(Debug, Clone, Default)]
pub struct TextBlock {
    pub rows: Vec<TextRow>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Spans whose baselines differ by at most this share a row.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate glyph width as a fraction of the font size. Glyph metrics are
/// not read, so widths are estimates.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum horizontal gap (points) between spans before a space is inserted.
const MIN_WORD_GAP: f32 = 1.5;

/// A vertical gap larger than this multiple of the previous row's font size
/// starts a new block.
const BLOCK_GAP_FACTOR: f32 = 1.4;

// ---------------------------------------------------------------------------
// CJK / spaceless-script helper
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script written without inter-word
/// spaces.
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF     // CJK Unified Ideographs
        | 0x3400..=0x4DBF   // Extension A
        | 0x20000..=0x2A6DF // Extension B
        | 0xF900..=0xFAFF   // Compatibility Ideographs
        | 0x3040..=0x30FF   // Hiragana, Katakana
        | 0x31F0..=0x31FF   // Katakana Phonetic Extensions
        | 0xAC00..=0xD7AF   // Hangul Syllables
        | 0x1100..=0x11FF   // Hangul Jamo
        | 0x3130..=0x318F   // Hangul Compatibility Jamo
        | 0x3000..=0x303F   // CJK Symbols and Punctuation
        | 0xFF00..=0xFFEF   // Fullwidth Forms
        | 0x0E00..=0x0EFF   // Thai, Lao
        | 0x1000..=0x109F   // Myanmar
        | 0x1780..=0x17FF   // Khmer
        | 0x0F00..=0x0FFF   // Tibetan
    )
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone)]
struct TextState {
    /// Resource key of the current font (`/F1`).
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Tz / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5]
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn set_font(&mut self, key: Vec<u8>, base_font: &str, size: f32) {
        self.font_key = key;
        self.font_name = base_font.to_string();
        self.font_size = size;
    }

    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }
}

fn estimate_text_width(text: &str, state: &TextState) -> f32 {
    text.chars().count() as f32 * state.char_width()
}

/// Advance the text matrix past `text`.
fn advance_after_show(text: &str, state: &mut TextState) {
    let dx: f32 = text
        .chars()
        .map(|ch| {
            let w = state.char_width() + state.char_spacing;
            if ch == ' ' {
                w + state.word_spacing
            } else {
                w
            }
        })
        .sum();
    state.advance_x(dx);
}

fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => backend.decode_text(page_id, font_key, bytes),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk a page's content stream and collect the text it shows.
///
/// | Operator | Action |
/// |----------|--------|
/// | `BT`     | Begin text object, reset matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix |
/// | `Td` `TD` `T*` | Move to a new line (`TD` also sets leading) |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Leading, spacing, scaling, rise |
/// | `Tj` `TJ` | Show a string / strings with kerning |
/// | `'` `"`  | Next line, then show |
///
/// Span text is cleaned and spans left empty are dropped.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<RawSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut state = TextState::default();
    let mut spans: Vec<RawSpan> = Vec::new();

    for op in &ops {
        let first_number = || op.operands.first().and_then(get_number_from_value);

        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => handle_tf(&op.operands, &fonts, &mut state),
            "Tm" => handle_tm(&op.operands, &mut state),
            "Td" | "TD" => {
                if let [tx, ty, ..] = op.operands.as_slice() {
                    let tx = get_number_from_value(tx).unwrap_or(0.0);
                    let ty = get_number_from_value(ty).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => {
                if let Some(v) = first_number() {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number() {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number() {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number() {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number() {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    emit_show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    handle_tj_array(arr, backend, page_id, &mut state, &mut spans);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = op.operands.first() {
                    emit_show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                if let [aw, ac, text, ..] = op.operands.as_slice() {
                    if let Some(aw) = get_number_from_value(aw) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(ac) {
                        state.char_spacing = ac;
                    }
                    state.next_line();
                    emit_show_string(text, backend, page_id, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    let [key, size, ..] = operands else {
        return;
    };
    let key = match key {
        PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
        _ => return,
    };
    let size = get_number_from_value(size).unwrap_or(0.0);

    let base = fonts
        .iter()
        .find(|info| info.name == key)
        .and_then(|info| info.base_font.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
    state.set_font(key, &base, size);
}

fn handle_tm(operands: &[PdfValue], state: &mut TextState) {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    if let &[a, b, c, d, e, f] = vals.as_slice() {
        state.text_matrix = [a, b, c, d, e, f];
        state.line_matrix = state.text_matrix;
    }
}

fn push_span(text: &str, x: f32, y: f32, state: &TextState, spans: &mut Vec<RawSpan>) {
    let cleaned = cleanup_span_text(text);
    if cleaned.is_empty() {
        return;
    }
    spans.push(RawSpan {
        width: estimate_text_width(&cleaned, state),
        text: cleaned,
        x,
        y,
        font_size: state.effective_font_size(),
        font_name: state.font_name.clone(),
    });
}

/// Shared by `Tj`, `'` and `"`.
fn emit_show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<RawSpan>,
) {
    let text = decode_string(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }
    push_span(&text, state.x(), state.y() + state.text_rise, state, spans);
    advance_after_show(&text, state);
}

/// `TJ` arrays mix strings with kerning adjustments in thousandths of a
/// text-space unit. The whole array becomes one span; an adjustment wide
/// enough to look like a word gap becomes a space.
fn handle_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<RawSpan>,
) {
    let mut buf = String::new();
    let mut span_x = state.x();
    let span_y = state.y() + state.text_rise;

    for elem in arr {
        if let PdfValue::Str(_) = elem {
            let fragment = decode_string(elem, backend, page_id, &state.font_key);
            if buf.is_empty() {
                span_x = state.x();
            }
            buf.push_str(&fragment);
            advance_after_show(&fragment, state);
        } else if let Some(adj) = get_number_from_value(elem) {
            let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
            if dx > state.char_width() * 0.3 && !buf.is_empty() {
                buf.push(' ');
            }
            state.advance_x(dx);
        }
    }

    push_span(&buf, span_x, span_y, state, spans);
}

// ---------------------------------------------------------------------------
// Public API: span -> row grouping
// ---------------------------------------------------------------------------

/// Group spans into rows, top of the page first.
pub fn group_spans_into_rows(mut spans: Vec<RawSpan>) -> Vec<TextRow> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut rows: Vec<TextRow> = Vec::new();
    let mut current: Vec<RawSpan> = Vec::new();

    for span in spans {
        let same_row = current
            .first()
            .is_none_or(|first| (span.y - first.y).abs() <= Y_TOLERANCE);
        if !same_row {
            rows.push(assemble_row(std::mem::take(&mut current)));
        }
        current.push(span);
    }

    if !current.is_empty() {
        rows.push(assemble_row(current));
    }

    rows
}

/// Build a row from spans sharing a baseline, merging adjacent same-font
/// spans and inserting inter-word spaces where the gap calls for one.
fn assemble_row(mut spans: Vec<RawSpan>) -> TextRow {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<RawSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            let same_font = prev.font_name == span.font_name
                && (prev.font_size - span.font_size).abs() < FONT_SIZE_BUCKET;

            if same_font && gap > -prev.font_size && gap < prev.font_size * 2.0 {
                if gap >= MIN_WORD_GAP && !boundary_is_spaceless(prev, &span) {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }

        merged.push(span);
    }

    TextRow {
        y: merged.first().map(|s| s.y).unwrap_or(0.0),
        x: merged.first().map(|s| s.x).unwrap_or(0.0),
        font_size: dominant_font_size(&merged),
        spans: merged,
    }
}

/// The font size covering the most characters.
fn dominant_font_size(spans: &[RawSpan]) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for s in spans {
        let key = (s.font_size * 100.0).round() as i32;
        *counts.entry(key).or_insert(0) += s.text.chars().count();
    }
    counts
        .into_iter()
        .max_by_key(|&(k, c)| (c, k))
        .map(|(k, _)| k as f32 / 100.0)
        .unwrap_or(0.0)
}

fn boundary_is_spaceless(prev: &RawSpan, next: &RawSpan) -> bool {
    match (prev.text.chars().next_back(), next.text.chars().next()) {
        (Some(l), Some(f)) => is_spaceless_script_char(l) && is_spaceless_script_char(f),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Public API: row -> block grouping
// ---------------------------------------------------------------------------

/// Group consecutive rows into blocks, splitting on large vertical gaps.
pub fn group_rows_into_blocks(rows: Vec<TextRow>) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current: Vec<TextRow> = Vec::new();

    for row in rows {
        let gap_break = current
            .last()
            .is_some_and(|prev| (prev.y - row.y).abs() > prev.font_size * BLOCK_GAP_FACTOR);

        if gap_break {
            blocks.push(TextBlock {
                rows: std::mem::take(&mut current),
            });
        }
        current.push(row);
    }

    if !current.is_empty() {
        blocks.push(TextBlock { rows: current });
    }

    blocks
}

// ---------------------------------------------------------------------------
// Public API: conversion to the page stream
// ---------------------------------------------------------------------------

/// Convert blocks to an `outline_core::Page` in top-origin coordinates.
pub fn to_page(index: usize, page_box: PageBox, blocks: Vec<TextBlock>) -> Page {
    let convert = |span: RawSpan| {
        let x0 = span.x - page_box.llx;
        let y1 = page_box.ury - span.y;
        Span {
            bbox: BBox::new(x0, y1 - span.font_size, x0 + span.width, y1),
            text: span.text,
            font_size: span.font_size,
            page: index,
        }
    };

    Page {
        index,
        height: page_box.height(),
        blocks: blocks
            .into_iter()
            .map(|block| Block {
                rows: block
                    .rows
                    .into_iter()
                    .map(|row| Row {
                        spans: row.spans.into_iter().map(&convert).collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Extract one page of the stream.
///
/// A page whose box or content cannot be read still yields a page: US
/// Letter dimensions, or no blocks.
pub fn build_page(backend: &dyn PdfBackend, index: usize, page_id: PageId) -> Page {
    let page_box = match backend.page_box(page_id) {
        Ok(b) if b.width() > 0.0 && b.height() > 0.0 => b,
        Ok(b) => {
            log::warn!("page {}: degenerate MediaBox {:?}, assuming US Letter", index, b);
            PageBox::LETTER
        }
        Err(e) => {
            log::warn!("page {}: {}, assuming US Letter", index, e);
            PageBox::LETTER
        }
    };

    let spans = extract_page_spans(backend, page_id).unwrap_or_else(|e| {
        log::warn!("page {}: cannot read text: {}", index, e);
        Vec::new()
    });
    log::debug!("page {}: {} spans", index, spans.len());

    let blocks = group_rows_into_blocks(group_spans_into_rows(spans));
    to_page(index, page_box, blocks)
}

/// Extract every page, in page order, with 0-based indices.
pub fn extract_pages(backend: &dyn PdfBackend) -> Vec<Page> {
    backend
        .pages()
        .into_values()
        .enumerate()
        .map(|(index, page_id)| build_page(backend, index, page_id))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
