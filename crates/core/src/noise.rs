//! Header/footer and boilerplate filtering.

use regex::Regex;

use crate::config::{compile_patterns, ConfigError, NoiseConfig};
use crate::types::{Line, Row};

/// Recognises running page furniture: page numbers, copyright lines and
/// version stamps.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    margin_ratio: f32,
    patterns: Vec<Regex>,
}

impl NoiseFilter {
    pub fn new(config: &NoiseConfig) -> Result<Self, ConfigError> {
        Ok(NoiseFilter {
            margin_ratio: config.margin_ratio,
            patterns: compile_patterns(&config.patterns, true)?,
        })
    }

    /// Whether `y` falls into the top or bottom margin band of the page.
    pub fn in_margin(&self, y: f32, page_height: f32) -> bool {
        y < page_height * self.margin_ratio || y > page_height * (1.0 - self.margin_ratio)
    }

    pub fn is_boilerplate(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    /// Classify a piece of text as non-content.
    ///
    /// Boilerplate inside the margin bands is noise, and so is boilerplate
    /// in the middle of the page: scanned layouts repeat footers mid-page.
    /// Text that merely sits in a margin band is kept, as top-of-page
    /// headings are common.
    pub fn classify(&self, text: &str, y: f32, page_height: f32) -> bool {
        let text = text.trim();
        if text.is_empty() || !self.is_boilerplate(text) {
            return false;
        }
        if !self.in_margin(y, page_height) {
            log::trace!("mid-page boilerplate at y={:.1}: {:?}", y, text);
        }
        true
    }

    /// Rebuild a row from its non-noise spans.
    ///
    /// Returns `None` when nothing but noise (or whitespace) remains.
    pub fn content_line(&self, row: &Row, page: usize, page_height: f32) -> Option<Line> {
        let mut parts: Vec<&str> = Vec::with_capacity(row.spans.len());
        let mut font_size: f32 = 0.0;
        let mut y_pos: Option<f32> = None;

        for span in &row.spans {
            let text = span.text.trim();
            if text.is_empty() || self.classify(text, span.bbox.y0, page_height) {
                continue;
            }
            parts.push(text);
            font_size = font_size.max(span.font_size);
            y_pos.get_or_insert(span.bbox.y0);
        }

        if parts.is_empty() || font_size <= 0.0 {
            return None;
        }

        Some(Line {
            text: parts.join(" "),
            font_size,
            y_pos: y_pos.unwrap_or(0.0),
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, Span};

    const PAGE_HEIGHT: f32 = 800.0;

    fn filter() -> NoiseFilter {
        NoiseFilter::new(&NoiseConfig::default()).unwrap()
    }

    fn make_span(text: &str, y: f32, font_size: f32) -> Span {
        Span {
            text: text.to_string(),
            font_size,
            bbox: BBox::new(72.0, y, 300.0, y + font_size),
            page: 0,
        }
    }

    #[test]
    fn test_page_n_of_m_in_bottom_margin() {
        assert!(filter().classify("Page 3 of 10", 770.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_boilerplate_mid_page_is_noise() {
        assert!(filter().classify("Page 3 of 10", 400.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_heading_in_top_margin_is_kept() {
        assert!(!filter().classify("Introduction", 20.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_pure_page_number() {
        assert!(filter().classify("12", 780.0, PAGE_HEIGHT));
        assert!(!filter().classify("12 Angry Men", 780.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_copyright_and_version_stamps() {
        let f = filter();
        assert!(f.classify("© 2023 Example Corp", 790.0, PAGE_HEIGHT));
        assert!(f.classify("Copyright 2021 Example Corp", 790.0, PAGE_HEIGHT));
        assert!(f.classify("Version 2014 Page 5 of 12", 790.0, PAGE_HEIGHT));
        assert!(f.classify("version 3.1 released - page 4 of 9", 10.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(filter().classify("PAGE 7 OF 20", 790.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_in_margin_bands() {
        let f = filter();
        assert!(f.in_margin(79.0, PAGE_HEIGHT));
        assert!(!f.in_margin(81.0, PAGE_HEIGHT));
        assert!(f.in_margin(721.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_empty_text_is_not_noise() {
        assert!(!filter().classify("   ", 790.0, PAGE_HEIGHT));
    }

    #[test]
    fn test_content_line_drops_noise_spans() {
        let row = Row {
            spans: vec![make_span("Overview", 750.0, 14.0), make_span("4", 750.0, 9.0)],
        };

        let line = filter().content_line(&row, 2, PAGE_HEIGHT).unwrap();
        assert_eq!(line.text, "Overview");
        assert!((line.font_size - 14.0).abs() < 0.01);
        assert!((line.y_pos - 750.0).abs() < 0.01);
        assert_eq!(line.page, 2);
    }

    #[test]
    fn test_content_line_joins_and_takes_max_size() {
        let row = Row {
            spans: vec![make_span(" 1. ", 100.0, 12.0), make_span("Scope", 101.0, 16.0)],
        };

        let line = filter().content_line(&row, 0, PAGE_HEIGHT).unwrap();
        assert_eq!(line.text, "1. Scope");
        assert!((line.font_size - 16.0).abs() < 0.01);
        assert!((line.y_pos - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_content_line_all_noise() {
        let row = Row {
            spans: vec![make_span("Page 1 of 2", 780.0, 9.0)],
        };
        assert!(filter().content_line(&row, 0, PAGE_HEIGHT).is_none());
    }
}
