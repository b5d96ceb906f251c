//! Title detection.
//!
//! The first pages are scanned for groups of adjacent lines set in the same
//! style. Each group becomes a [`Candidate`] and is scored on five weighted
//! factors:
//!
//! | factor    | range  | signal                                        |
//! |-----------|--------|-----------------------------------------------|
//! | font size | 0..30  | size relative to the largest observed size    |
//! | position  | 0..25  | high up on the first page                     |
//! | keywords  | 0..25  | title-indicative words                        |
//! | patterns  | 0..10  | title-indicative regexes                      |
//! | shape     | 0..10  | several words, title case or upper case       |
//!
//! minus penalties for very short, very long and numbered text. The best
//! candidate, joined with nearby subtitle candidates, becomes the [`Title`].

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::{compile_patterns, ConfigError, TitleConfig};
use crate::noise::NoiseFilter;
use crate::stats::FontSizeStatistics;
use crate::text::{char_count, is_all_uppercase, is_title_case, word_count};
use crate::types::{Candidate, Line, Page, Title};

fn numbered_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[.\s]").unwrap())
}

/// Per-factor contributions to a title score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub font_size: f32,
    pub position: f32,
    pub keywords: f32,
    pub patterns: f32,
    pub shape: f32,
    pub penalty: f32,
}

impl ScoreBreakdown {
    /// Sum of the factors minus penalties, never below zero.
    pub fn total(&self) -> f32 {
        let sum = self.font_size + self.position + self.keywords + self.patterns + self.shape;
        (sum - self.penalty).max(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct TitleDetector {
    config: TitleConfig,
    keywords: Vec<String>,
    subtitle_keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl TitleDetector {
    pub fn new(config: &TitleConfig) -> Result<Self, ConfigError> {
        Ok(TitleDetector {
            config: config.clone(),
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            subtitle_keywords: config
                .subtitle_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            patterns: compile_patterns(&config.patterns, false)?,
        })
    }

    /// Find the document title.
    pub fn detect(
        &self,
        pages: &[Page],
        noise: &NoiseFilter,
        stats: &FontSizeStatistics,
    ) -> Title {
        let candidates = self.candidates(pages, noise, stats);
        log::debug!("title: {} candidates", candidates.len());
        self.select(&candidates)
    }

    /// Generate scored candidates in page, block, group order.
    pub fn candidates(
        &self,
        pages: &[Page],
        noise: &NoiseFilter,
        stats: &FontSizeStatistics,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for page in pages.iter().take(self.config.sample_pages) {
            for block in &page.blocks {
                let lines: Vec<Line> = block
                    .rows
                    .iter()
                    .filter_map(|row| noise.content_line(row, page.index, page.height))
                    .collect();

                for group in self.group_lines(lines) {
                    let text = group
                        .iter()
                        .map(|l| l.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string();
                    if char_count(&text) < self.config.min_candidate_chars {
                        continue;
                    }

                    let font_size =
                        group.iter().map(|l| l.font_size).sum::<f32>() / group.len() as f32;
                    let y_pos = group[0].y_pos;
                    let score = self.score(&text, font_size, y_pos, page.index, stats);

                    candidates.push(Candidate {
                        text,
                        font_size,
                        score,
                        lines: group,
                        page: page.index,
                    });
                }
            }
        }

        candidates
    }

    /// Merge consecutive lines that are vertically close and share a size.
    fn group_lines(&self, lines: Vec<Line>) -> Vec<Vec<Line>> {
        let mut groups: Vec<Vec<Line>> = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            let joins = current.last().is_some_and(|prev| {
                (prev.y_pos - line.y_pos).abs() < self.config.group_max_gap
                    && (prev.font_size - line.font_size).abs() < self.config.group_max_size_delta
            });

            if !joins && !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.push(line);
        }

        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }

    pub fn score(
        &self,
        text: &str,
        font_size: f32,
        y_pos: f32,
        page: usize,
        stats: &FontSizeStatistics,
    ) -> f32 {
        self.score_breakdown(text, font_size, y_pos, page, stats).total()
    }

    pub fn score_breakdown(
        &self,
        text: &str,
        font_size: f32,
        y_pos: f32,
        page: usize,
        stats: &FontSizeStatistics,
    ) -> ScoreBreakdown {
        let w = &self.config.weights;
        let lower = text.to_lowercase();
        let mut breakdown = ScoreBreakdown::default();

        if let Some(max_size) = stats.max_size().filter(|&m| m > 0.0) {
            breakdown.font_size = (font_size / max_size * w.font_size).min(w.font_size);
        }

        if page == 0 {
            if y_pos < w.position_top_limit {
                breakdown.position = w.position_top;
            } else if y_pos < w.position_upper_limit {
                breakdown.position = w.position_upper;
            }
        }

        let keyword_hits = self
            .keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count();
        breakdown.keywords = (keyword_hits as f32 * w.keyword_each).min(w.keyword_cap);

        let pattern_hits = self.patterns.iter().filter(|re| re.is_match(&lower)).count();
        breakdown.patterns = (pattern_hits as f32 * w.pattern_each).min(w.pattern_cap);

        if word_count(text) >= 2 {
            breakdown.shape += w.multi_word;
        }
        if is_title_case(text) || is_all_uppercase(text) {
            breakdown.shape += w.title_case;
        }

        let len = char_count(text);
        if len < w.short_limit {
            breakdown.penalty += w.short_penalty;
        }
        if len > w.long_limit {
            breakdown.penalty += w.long_penalty;
        }
        if numbered_prefix().is_match(text) {
            breakdown.penalty += w.numbered_penalty;
        }

        breakdown
    }

    /// Pick the best candidate and merge its subtitle parts.
    ///
    /// Ties go to the first candidate generated.
    pub fn select(&self, candidates: &[Candidate]) -> Title {
        let mut best: Option<(usize, &Candidate)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if best.is_none_or(|(_, b)| candidate.score > b.score) {
                best = Some((idx, candidate));
            }
        }

        let Some((best_idx, best)) = best else {
            return self.fallback();
        };

        let mut parts: Vec<&Candidate> = vec![best];
        for (idx, candidate) in candidates.iter().enumerate() {
            if idx == best_idx || candidate.page != best.page {
                continue;
            }
            if (candidate.y_pos() - best.y_pos()).abs() >= self.config.related_max_gap {
                continue;
            }
            let lower = candidate.text.to_lowercase();
            if self
                .subtitle_keywords
                .iter()
                .any(|k| lower.contains(k.as_str()))
            {
                parts.push(candidate);
            }
        }

        parts.sort_by(|a, b| {
            a.y_pos()
                .partial_cmp(&b.y_pos())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let text = parts
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.config.separator);

        log::debug!(
            "title: {:?} (score {:.1}, {} related parts)",
            text,
            best.score,
            parts.len() - 1
        );

        Title {
            parts: split_parts(&text, &self.config.separator),
            text,
            font_size: best.font_size,
            lines: parts.iter().flat_map(|c| c.lines.iter().cloned()).collect(),
        }
    }

    /// Title used when no candidate qualifies.
    pub fn fallback(&self) -> Title {
        let text = self.config.fallback_title.clone();
        Title {
            parts: split_parts(&text, &self.config.separator),
            text,
            font_size: self.config.fallback_font_size,
            lines: Vec::new(),
        }
    }
}

fn split_parts(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![text.trim().to_string()];
    }
    text.split(separator).map(|p| p.trim().to_string()).collect()
}

impl Title {
    /// Whether `line` is one of the lines the title was built from.
    pub fn owns_line(&self, line: &Line) -> bool {
        self.lines.iter().any(|l| {
            l.page == line.page && l.text == line.text && (l.y_pos - line.y_pos).abs() < 0.01
        })
    }

    /// Whether `text` is the title or one of its components.
    ///
    /// A line is a component when it equals a separator-delimited part of
    /// the title, or when at least `overlap_ratio` of its distinct words
    /// (two or more) also occur in the title.
    pub fn contains_line(&self, text: &str, overlap_ratio: f32) -> bool {
        let text = text.trim();
        if self.text.is_empty() || text.is_empty() {
            return false;
        }

        if text == self.text.trim() || self.parts.iter().any(|p| p == text) {
            return true;
        }

        let text_lower = text.to_lowercase();
        let title_lower = self.text.to_lowercase();
        let text_words: HashSet<&str> = text_lower.split_whitespace().collect();
        let title_words: HashSet<&str> = title_lower.split_whitespace().collect();

        if text_words.len() < 2 {
            return false;
        }
        let shared = text_words.intersection(&title_words).count();
        shared as f32 >= text_words.len() as f32 * overlap_ratio
    }
}
