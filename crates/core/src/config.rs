//! Tunable weights, thresholds and pattern lists for the classifier.
//!
//! Every number the classifier compares against lives here so that each
//! scoring factor can be probed in isolation and adjusted without touching
//! the detectors. All structs deserialize with `#[serde(default)]`: a partial
//! JSON document only overrides the fields it names.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub statistics: StatisticsConfig,
    pub noise: NoiseConfig,
    pub title: TitleConfig,
    pub heading: HeadingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Number of leading pages sampled.
    pub sample_pages: usize,
    /// Spans shorter than this (in characters) are not counted.
    pub min_span_chars: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            sample_pages: 3,
            min_span_chars: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Fraction of the page height treated as header/footer margin.
    pub margin_ratio: f32,
    /// Boilerplate patterns, matched case-insensitively anywhere in the text.
    pub patterns: Vec<String>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            margin_ratio: 0.10,
            patterns: to_strings(&[
                r"^page\s+\d+\s+of\s+\d+$",
                r"^page\s+\d+$",
                r"^\d+$",
                r"version\s+\d+.*page\s+\d+\s+of\s+\d+",
                r"^version.\d{4}.*page.",
                r"©.*\d{4}",
                r"copyright\s+(©\s*)?\d{4}",
                r"all rights reserved",
            ]),
        }
    }
}

/// Weights of the title score. The factor maxima add up to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleWeights {
    pub font_size: f32,
    pub position_top: f32,
    pub position_upper: f32,
    pub position_top_limit: f32,
    pub position_upper_limit: f32,
    pub keyword_each: f32,
    pub keyword_cap: f32,
    pub pattern_each: f32,
    pub pattern_cap: f32,
    pub multi_word: f32,
    pub title_case: f32,
    pub short_penalty: f32,
    pub short_limit: usize,
    pub long_penalty: f32,
    pub long_limit: usize,
    pub numbered_penalty: f32,
}

impl Default for TitleWeights {
    fn default() -> Self {
        Self {
            font_size: 30.0,
            position_top: 25.0,
            position_upper: 15.0,
            position_top_limit: 300.0,
            position_upper_limit: 500.0,
            keyword_each: 8.0,
            keyword_cap: 25.0,
            pattern_each: 10.0,
            pattern_cap: 10.0,
            multi_word: 5.0,
            title_case: 5.0,
            short_penalty: 10.0,
            short_limit: 5,
            long_penalty: 5.0,
            long_limit: 100,
            numbered_penalty: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub sample_pages: usize,
    /// Consecutive lines closer than this join the same group.
    pub group_max_gap: f32,
    /// ... provided their font sizes differ by less than this.
    pub group_max_size_delta: f32,
    pub min_candidate_chars: usize,
    /// Maximum distance between the primary title and a related part.
    pub related_max_gap: f32,
    pub separator: String,
    pub fallback_title: String,
    pub fallback_font_size: f32,
    /// Title-indicative keywords, matched as lowercase substrings.
    pub keywords: Vec<String>,
    /// Title patterns, searched in the lowercased text.
    pub patterns: Vec<String>,
    /// Keywords that mark a nearby candidate as a subtitle.
    pub subtitle_keywords: Vec<String>,
    pub weights: TitleWeights,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            sample_pages: 2,
            group_max_gap: 30.0,
            group_max_size_delta: 2.0,
            min_candidate_chars: 5,
            related_max_gap: 100.0,
            separator: " - ".to_string(),
            fallback_title: "Unknown Document".to_string(),
            fallback_font_size: 12.0,
            keywords: to_strings(&[
                "syllabus",
                "foundation",
                "level",
                "extensions",
                "overview",
                "certification",
                "qualification",
                "standard",
                "guidelines",
            ]),
            patterns: to_strings(&[
                r".foundation.*level.",
                r".syllabus.",
                r".overview.",
                r".certification.",
                r".qualification.",
            ]),
            subtitle_keywords: to_strings(&["overview", "summary", "introduction"]),
            weights: TitleWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    pub min_chars: usize,
    pub max_chars: usize,
    pub min_font_size: f32,
    /// Unnumbered lines need at least this size to count as headings.
    pub prominent_font_size: f32,
    pub max_upper_words: usize,
    /// Same-level heading lines closer than this are merged.
    pub merge_max_gap: f32,
    /// Tolerance when matching a size against the ranked statistics.
    pub level_tolerance: f32,
    pub fallback_h1_size: f32,
    pub fallback_h2_size: f32,
    /// Share of a line's distinct words that must appear in the title for
    /// the line to count as part of the title.
    pub title_overlap_ratio: f32,
    /// Structural patterns, anchored at the start of the line.
    pub patterns: Vec<String>,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            min_chars: 3,
            max_chars: 200,
            min_font_size: 11.0,
            prominent_font_size: 13.0,
            max_upper_words: 10,
            merge_max_gap: 20.0,
            level_tolerance: 1.0,
            fallback_h1_size: 14.0,
            fallback_h2_size: 12.0,
            title_overlap_ratio: 0.8,
            patterns: to_strings(&[
                r"^(CHAPTER|Chapter)\s+\d+",
                r"^\d+\.\s+[A-Z][^.]*$",
                r"^\d+\.\d+\s+[A-Z]",
                r"^\d+\.\d+\.\d+\s+[A-Z]",
                r"^[A-Z\s]{5,50}$",
                r"^\d+[\.\)]\s+[A-Z][a-z]+",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Compile a list of user-supplied patterns.
pub(crate) fn compile_patterns(
    patterns: &[String],
    case_insensitive: bool,
) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}
