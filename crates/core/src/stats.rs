//! Font-size frequency table sampled from the first pages of a document.

use std::collections::BTreeMap;

use crate::config::StatisticsConfig;
use crate::types::Page;

/// Quantisation bucket width for font sizes (points).
pub const FONT_SIZE_BUCKET: f32 = 0.5;

/// Quantise a font size into a histogram bucket.
pub fn bucket(size: f32) -> f32 {
    (size / FONT_SIZE_BUCKET).round() * FONT_SIZE_BUCKET
}

fn key(size: f32) -> i32 {
    (bucket(size) * 100.0).round() as i32
}

/// Occurrence count per quantised font size.
///
/// Built once per document and never mutated afterwards, so the size that
/// decides a heading level is the same on every page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontSizeStatistics {
    counts: BTreeMap<i32, usize>,
}

impl FontSizeStatistics {
    /// Count the spans of the first `sample_pages` pages.
    ///
    /// Only spans with at least `min_span_chars` characters are counted so
    /// that bullets, stray glyphs and page numbers do not skew the scale.
    pub fn from_pages(pages: &[Page], config: &StatisticsConfig) -> Self {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();

        for page in pages.iter().take(config.sample_pages) {
            for row in page.rows() {
                for span in &row.spans {
                    if span.font_size <= 0.0 {
                        continue;
                    }
                    if span.text.trim().chars().count() < config.min_span_chars {
                        continue;
                    }
                    *counts.entry(key(span.font_size)).or_insert(0) += 1;
                }
            }
        }

        log::debug!("font statistics: {} distinct sizes", counts.len());

        FontSizeStatistics { counts }
    }

    /// Build a table directly from `(size, count)` pairs.
    pub fn from_counts(pairs: impl IntoIterator<Item = (f32, usize)>) -> Self {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for (size, count) in pairs {
            *counts.entry(key(size)).or_insert(0) += count;
        }
        FontSizeStatistics { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Occurrences of the bucket `size` falls into.
    pub fn count(&self, size: f32) -> usize {
        self.counts.get(&key(size)).copied().unwrap_or(0)
    }

    pub fn max_size(&self) -> Option<f32> {
        self.counts.keys().next_back().map(|&k| k as f32 / 100.0)
    }

    /// Observed sizes, largest first.
    pub fn sizes_descending(&self) -> Vec<f32> {
        self.counts.keys().rev().map(|&k| k as f32 / 100.0).collect()
    }

    /// `(size, count)` pairs, largest size first.
    pub fn iter(&self) -> impl Iterator<Item = (f32, usize)> + '_ {
        self.counts.iter().rev().map(|(&k, &c)| (k as f32 / 100.0, c))
    }

    /// Whether `a` and `b` fall into the same bucket.
    pub fn same_bucket(a: f32, b: f32) -> bool {
        key(a) == key(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, Block, Row, Span};

    fn make_span(text: &str, font_size: f32) -> Span {
        Span {
            text: text.to_string(),
            font_size,
            bbox: BBox::default(),
            page: 0,
        }
    }

    fn make_page(index: usize, spans: Vec<Span>) -> Page {
        Page {
            index,
            height: 792.0,
            blocks: vec![Block {
                rows: spans.into_iter().map(|s| Row { spans: vec![s] }).collect(),
            }],
        }
    }

    #[test]
    fn test_counts_spans_per_size() {
        let pages = vec![make_page(
            0,
            vec![
                make_span("Heading text", 16.0),
                make_span("Body text one", 11.0),
                make_span("Body text two", 11.0),
            ],
        )];

        let stats = FontSizeStatistics::from_pages(&pages, &StatisticsConfig::default());
        assert_eq!(stats.count(16.0), 1);
        assert_eq!(stats.count(11.0), 2);
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_short_spans_ignored() {
        let pages = vec![make_page(
            0,
            vec![make_span("abc", 20.0), make_span("  12 ", 20.0), make_span("abcd", 10.0)],
        )];

        let stats = FontSizeStatistics::from_pages(&pages, &StatisticsConfig::default());
        assert_eq!(stats.count(20.0), 0);
        assert_eq!(stats.count(10.0), 1);
    }

    #[test]
    fn test_only_first_pages_sampled() {
        let pages: Vec<Page> = (0..5)
            .map(|i| make_page(i, vec![make_span("Sample text", 10.0 + i as f32)]))
            .collect();

        let stats = FontSizeStatistics::from_pages(&pages, &StatisticsConfig::default());
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.count(13.0), 0);
        assert_eq!(stats.max_size(), Some(12.0));
    }

    #[test]
    fn test_empty_document_yields_empty_table() {
        let stats = FontSizeStatistics::from_pages(&[], &StatisticsConfig::default());
        assert!(stats.is_empty());
        assert_eq!(stats.max_size(), None);
        assert!(stats.sizes_descending().is_empty());
    }

    #[test]
    fn test_zero_size_ignored() {
        let pages = vec![make_page(0, vec![make_span("invisible", 0.0)])];
        let stats = FontSizeStatistics::from_pages(&pages, &StatisticsConfig::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_sizes_are_quantised() {
        let stats = FontSizeStatistics::from_counts([(15.96, 1), (16.04, 2), (11.02, 4)]);
        assert_eq!(stats.count(16.0), 3);
        assert_eq!(stats.sizes_descending(), vec![16.0, 11.0]);
    }

    #[test]
    fn test_iter_largest_first() {
        let stats = FontSizeStatistics::from_counts([(11.0, 40), (16.0, 1), (13.0, 5)]);
        let pairs: Vec<(f32, usize)> = stats.iter().collect();
        assert_eq!(pairs, vec![(16.0, 1), (13.0, 5), (11.0, 40)]);
    }

    #[test]
    fn test_bucket_rounds_correctly() {
        assert!((bucket(12.0) - 12.0).abs() < 0.01);
        assert!((bucket(12.2) - 12.0).abs() < 0.01);
        assert!((bucket(12.3) - 12.5).abs() < 0.01);
        assert!((bucket(12.8) - 13.0).abs() < 0.01);
    }

    #[test]
    fn test_same_bucket() {
        assert!(FontSizeStatistics::same_bucket(24.0, 24.1));
        assert!(!FontSizeStatistics::same_bucket(24.0, 23.0));
    }
}
