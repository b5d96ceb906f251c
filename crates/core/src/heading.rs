//! Heading detection and level assignment.
//!
//! Every content line outside the title is tested with the heading predicate
//! of [`HeadingDetector::is_heading`]. Qualifying lines get a level from the
//! font-size ranking of the document statistics (or from numbering and
//! absolute sizes when no statistics exist), and a small accumulator merges a
//! heading that wraps onto a second rendered line back into one entry. A
//! merged entry that spells out the title is flagged title-equivalent.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::{compile_patterns, ConfigError, HeadingConfig};
use crate::noise::NoiseFilter;
use crate::stats::FontSizeStatistics;
use crate::text::{char_count, is_all_uppercase, word_count};
use crate::types::{DetectedHeading, DetectedLevel, HeadingLevel, Line, Page, Title};

fn numeric_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s.\-_]+$").unwrap())
}

fn chapter_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(CHAPTER|Chapter)").unwrap())
}

fn numbered_h1() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s+").unwrap())
}

fn numbered_h2() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\s+").unwrap())
}

fn numbered_h3() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+\s+").unwrap())
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    level: HeadingLevel,
    page: usize,
    y_pos: f32,
}

/// Receives finished headings. A merged heading whose text turns out to be
/// the title is marked title-equivalent so cleanup drops it.
struct Sink<'a> {
    title: &'a Title,
    overlap_ratio: f32,
    out: &'a mut Vec<DetectedHeading>,
}

impl Sink<'_> {
    fn emit(&mut self, pending: Pending) {
        let level = if self.title.contains_line(&pending.text, self.overlap_ratio) {
            DetectedLevel::TitleEquivalent
        } else {
            DetectedLevel::Heading(pending.level)
        };
        self.out.push(DetectedHeading {
            level,
            text: pending.text,
            page: pending.page,
        });
    }
}

/// In-progress heading within one page.
#[derive(Debug, Clone, Default)]
enum Accumulator {
    #[default]
    Idle,
    Accumulating(Pending),
}

impl Accumulator {
    /// Feed a heading line: continue the pending heading when the line has
    /// the same level and sits within `max_gap` of the heading's first line,
    /// otherwise emit the pending heading and start a new one.
    fn push(&mut self, line: &Line, level: HeadingLevel, max_gap: f32, sink: &mut Sink<'_>) {
        if let Accumulator::Accumulating(pending) = self {
            if pending.level == level && (pending.y_pos - line.y_pos).abs() < max_gap {
                pending.text.push(' ');
                pending.text.push_str(&line.text);
                return;
            }
        }

        self.flush(sink);
        *self = Accumulator::Accumulating(Pending {
            text: line.text.clone(),
            level,
            page: line.page,
            y_pos: line.y_pos,
        });
    }

    /// Emit the pending heading, if any, and return to idle.
    fn flush(&mut self, sink: &mut Sink<'_>) {
        if let Accumulator::Accumulating(pending) = std::mem::take(self) {
            sink.emit(pending);
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HeadingDetector {
    config: HeadingConfig,
    patterns: Vec<Regex>,
}

impl HeadingDetector {
    pub fn new(config: &HeadingConfig) -> Result<Self, ConfigError> {
        Ok(HeadingDetector {
            config: config.clone(),
            patterns: compile_patterns(&config.patterns, false)?,
        })
    }

    /// Decide whether a content line is a heading rather than body text.
    /// The title and its components never are.
    pub fn is_heading(&self, text: &str, font_size: f32, title: &Title) -> bool {
        !title.contains_line(text, self.config.title_overlap_ratio)
            && self.has_heading_shape(text, font_size)
    }

    /// Length, size and pattern tests of [`Self::is_heading`], without the
    /// title comparison.
    fn has_heading_shape(&self, text: &str, font_size: f32) -> bool {
        let len = char_count(text);
        if len < self.config.min_chars || len > self.config.max_chars {
            return false;
        }
        if numeric_only().is_match(text) {
            return false;
        }
        if font_size < self.config.min_font_size {
            return false;
        }

        if self.patterns.iter().any(|re| re.is_match(text)) {
            return true;
        }

        if font_size >= self.config.prominent_font_size {
            if is_all_uppercase(text) && word_count(text) <= self.config.max_upper_words {
                return true;
            }
            let starts_upper = text.chars().next().is_some_and(|c| c.is_uppercase());
            if starts_upper && !text.ends_with('.') {
                return true;
            }
        }

        false
    }

    /// Assign a level to a heading line.
    ///
    /// The statistics sizes, largest first and without the title's size,
    /// form the ranking: within `level_tolerance` of the first size is H1,
    /// of the second is H2, anything smaller is H3.
    pub fn level(
        &self,
        text: &str,
        font_size: f32,
        title: &Title,
        stats: &FontSizeStatistics,
    ) -> HeadingLevel {
        if chapter_prefix().is_match(text) {
            return HeadingLevel::H1;
        }

        let ranked: Vec<f32> = stats
            .sizes_descending()
            .into_iter()
            .filter(|&s| !FontSizeStatistics::same_bucket(s, title.font_size))
            .collect();

        let tolerance = self.config.level_tolerance;
        match ranked.as_slice() {
            [first, ..] if font_size >= first - tolerance => HeadingLevel::H1,
            [_, second, ..] if font_size >= second - tolerance => HeadingLevel::H2,
            [_, ..] => HeadingLevel::H3,
            [] => self.fallback_level(text, font_size),
        }
    }

    /// Level from numbering and absolute size, used without statistics.
    fn fallback_level(&self, text: &str, font_size: f32) -> HeadingLevel {
        if numbered_h1().is_match(text) && font_size >= self.config.fallback_h1_size {
            HeadingLevel::H1
        } else if numbered_h2().is_match(text) {
            HeadingLevel::H2
        } else if numbered_h3().is_match(text) {
            HeadingLevel::H3
        } else if font_size >= self.config.fallback_h1_size {
            HeadingLevel::H1
        } else if font_size >= self.config.fallback_h2_size {
            HeadingLevel::H2
        } else {
            HeadingLevel::H3
        }
    }

    /// Scan every page and collect heading entries in detection order.
    pub fn detect(
        &self,
        pages: &[Page],
        noise: &NoiseFilter,
        title: &Title,
        stats: &FontSizeStatistics,
    ) -> Vec<DetectedHeading> {
        let mut headings = Vec::new();
        for page in pages {
            self.scan_page(page, noise, title, stats, &mut headings);
        }
        log::debug!("headings: {} detected before cleanup", headings.len());
        headings
    }

    fn scan_page(
        &self,
        page: &Page,
        noise: &NoiseFilter,
        title: &Title,
        stats: &FontSizeStatistics,
        out: &mut Vec<DetectedHeading>,
    ) {
        let overlap_ratio = self.config.title_overlap_ratio;
        let mut sink = Sink {
            title,
            overlap_ratio,
            out,
        };
        let mut acc = Accumulator::Idle;

        for row in page.rows() {
            let Some(line) = noise.content_line(row, page.index, page.height) else {
                continue;
            };

            if title.owns_line(&line) || title.contains_line(&line.text, overlap_ratio) {
                log::trace!("page {}: title line {:?}", page.index, line.text);
                continue;
            }

            if self.has_heading_shape(&line.text, line.font_size) {
                let level = self.level(&line.text, line.font_size, title, stats);
                log::trace!("page {}: {:?} {:?}", page.index, level, line.text);
                acc.push(&line, level, self.config.merge_max_gap, &mut sink);
            } else {
                acc.flush(&mut sink);
            }
        }

        // Headings never span a page boundary.
        acc.flush(&mut sink);
    }
}
