//! Per-document pipeline: statistics, title, headings, cleanup.

use crate::config::{ConfigError, ExtractorConfig};
use crate::dedupe::clean_and_sort;
use crate::heading::HeadingDetector;
use crate::noise::NoiseFilter;
use crate::stats::FontSizeStatistics;
use crate::title::TitleDetector;
use crate::types::{Candidate, DetectedHeading, DocumentOutline, Page, Title};

/// Intermediate results of one extraction, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub statistics: FontSizeStatistics,
    pub title: Title,
    pub headings: Vec<DetectedHeading>,
}

impl Analysis {
    pub fn into_outline(self) -> DocumentOutline {
        DocumentOutline {
            title: self.title.text,
            outline: clean_and_sort(self.headings),
        }
    }
}

/// Turns the page stream of one document into its outline.
///
/// All patterns are compiled once in [`OutlineExtractor::new`]. The
/// extractor holds no per-document state, so a single instance can be
/// shared across documents and threads.
#[derive(Debug, Clone)]
pub struct OutlineExtractor {
    config: ExtractorConfig,
    noise: NoiseFilter,
    title: TitleDetector,
    heading: HeadingDetector,
}

impl OutlineExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ConfigError> {
        Ok(OutlineExtractor {
            noise: NoiseFilter::new(&config.noise)?,
            title: TitleDetector::new(&config.title)?,
            heading: HeadingDetector::new(&config.heading)?,
            config,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn noise_filter(&self) -> &NoiseFilter {
        &self.noise
    }

    pub fn heading_detector(&self) -> &HeadingDetector {
        &self.heading
    }

    pub fn statistics(&self, pages: &[Page]) -> FontSizeStatistics {
        FontSizeStatistics::from_pages(pages, &self.config.statistics)
    }

    /// Scored title candidates, in generation order.
    pub fn title_candidates(&self, pages: &[Page], stats: &FontSizeStatistics) -> Vec<Candidate> {
        self.title.candidates(pages, &self.noise, stats)
    }

    /// Run every stage and keep the intermediate results.
    pub fn analyze(&self, pages: &[Page]) -> Analysis {
        let statistics = self.statistics(pages);
        let title = self.title.detect(pages, &self.noise, &statistics);
        let headings = self.heading.detect(pages, &self.noise, &title, &statistics);

        Analysis {
            statistics,
            title,
            headings,
        }
    }

    pub fn extract(&self, pages: &[Page]) -> DocumentOutline {
        let outline = self.analyze(pages).into_outline();
        log::info!(
            "extracted title {:?} with {} headings from {} pages",
            outline.title,
            outline.outline.len(),
            pages.len()
        );
        outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, Block, Heading, HeadingLevel, Row, Span};

    fn extractor() -> OutlineExtractor {
        OutlineExtractor::new(ExtractorConfig::default()).unwrap()
    }

    /// Rows of `(text, y, font_size)`; each row becomes its own block.
    fn page(index: usize, rows: &[(&str, f32, f32)]) -> Page {
        Page {
            index,
            height: 792.0,
            blocks: rows
                .iter()
                .map(|&(text, y, font_size)| Block {
                    rows: vec![Row {
                        spans: vec![Span {
                            text: text.to_string(),
                            font_size,
                            bbox: BBox::new(72.0, y, 500.0, y + font_size),
                            page: index,
                        }],
                    }],
                })
                .collect(),
        }
    }

    fn heading(level: HeadingLevel, text: &str, page: usize) -> Heading {
        Heading {
            level,
            text: text.to_string(),
            page,
        }
    }

    const BODY: &str = "The library will digitise its archive over five years.";

    /// Three pages with a title, a running header that repeats the title,
    /// numbered sections and page-number footers.
    fn report() -> Vec<Page> {
        vec![
            page(
                0,
                &[
                    ("Digital Library Strategy", 90.0, 24.0),
                    (BODY, 200.0, 11.0),
                    (BODY, 214.0, 11.0),
                ],
            ),
            page(
                1,
                &[
                    ("Digital Library Strategy", 40.0, 13.0),
                    ("1. Introduction", 100.0, 16.0),
                    (BODY, 130.0, 11.0),
                    (BODY, 144.0, 11.0),
                    ("1.1 Background", 200.0, 13.0),
                    (BODY, 230.0, 11.0),
                    ("Page 2 of 3", 770.0, 9.0),
                ],
            ),
            page(
                2,
                &[
                    ("Digital Library Strategy", 40.0, 13.0),
                    ("2. Approach", 100.0, 16.0),
                    (BODY, 130.0, 11.0),
                    ("Page 3 of 3", 770.0, 9.0),
                ],
            ),
        ]
    }

    #[test]
    fn test_report_outline() {
        let outline = extractor().extract(&report());
        assert_eq!(outline.title, "Digital Library Strategy");
        assert_eq!(
            outline.outline,
            vec![
                heading(HeadingLevel::H1, "1. Introduction", 1),
                heading(HeadingLevel::H2, "1.1 Background", 1),
                heading(HeadingLevel::H1, "2. Approach", 2),
            ]
        );
    }

    #[test]
    fn test_single_chapter_line_becomes_title() {
        let pages = vec![page(0, &[("CHAPTER 1 INTRODUCTION", 100.0, 18.0)])];
        let ex = extractor();

        let stats = ex.statistics(&pages);
        let candidates = ex.title_candidates(&pages, &stats);
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].score - 65.0).abs() < 0.01);

        let outline = ex.extract(&pages);
        assert_eq!(outline.title, "CHAPTER 1 INTRODUCTION");
        assert!(outline.outline.is_empty());
    }

    #[test]
    fn test_title_with_subtitle_part() {
        let pages = vec![
            page(
                0,
                &[
                    ("Foundation Level Extensions", 100.0, 24.0),
                    ("Overview", 140.0, 16.0),
                    (BODY, 300.0, 11.0),
                ],
            ),
            page(1, &[("1. Business Outcomes", 100.0, 16.0), (BODY, 130.0, 11.0)]),
        ];

        let outline = extractor().extract(&pages);
        assert_eq!(outline.title, "Foundation Level Extensions - Overview");
        assert_eq!(
            outline.outline,
            vec![heading(HeadingLevel::H1, "1. Business Outcomes", 1)]
        );
    }

    #[test]
    fn test_page_footer_never_surfaces() {
        let outline = extractor().extract(&report());
        assert!(!outline.title.contains("Page"));
        assert!(outline.outline.iter().all(|h| !h.text.contains("Page")));
    }

    #[test]
    fn test_body_paragraph_not_heading() {
        let ex = extractor();
        let title = Title {
            text: "Unknown Document".to_string(),
            font_size: 12.0,
            lines: Vec::new(),
            parts: vec!["Unknown Document".to_string()],
        };
        assert!(!ex
            .heading_detector()
            .is_heading("In this section we describe...", 11.0, &title));
    }

    #[test]
    fn test_levels_follow_statistics() {
        let mut rows: Vec<(&str, f32, f32)> = vec![
            ("Methodology Handbook", 60.0, 28.0),
            ("1. Introduction", 200.0, 16.0),
            ("1.1 Background", 230.0, 13.0),
        ];
        let extra = ["Scope of work", "Audience notes", "Terms in use", "Key outcomes"];
        for (i, text) in extra.iter().enumerate() {
            rows.push((text, 270.0 + i as f32 * 40.0, 13.0));
        }

        let outline = extractor().extract(&[page(0, &rows)]);
        assert_eq!(outline.title, "Methodology Handbook");
        assert_eq!(outline.outline.len(), 6);
        assert_eq!(outline.outline[0], heading(HeadingLevel::H1, "1. Introduction", 0));
        assert!(outline.outline[1..]
            .iter()
            .all(|h| h.level == HeadingLevel::H2));
    }

    #[test]
    fn test_empty_document() {
        let outline = extractor().extract(&[]);
        assert_eq!(outline.title, "Unknown Document");
        assert!(outline.outline.is_empty());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let ex = extractor();
        let first = ex.extract(&report());
        let other = vec![page(0, &[("Something Else Entirely", 80.0, 20.0)])];
        let _ = ex.extract(&other);
        assert_eq!(ex.extract(&report()), first);
    }

    #[test]
    fn test_title_never_in_outline() {
        let ex = extractor();
        let analysis = ex.analyze(&report());
        let title = analysis.title.clone();
        let outline = analysis.into_outline();

        for h in &outline.outline {
            assert_ne!(h.text, title.text);
            assert!(!title.parts.contains(&h.text));
        }
    }

    #[test]
    fn test_outline_is_page_ordered_without_duplicates() {
        let mut pages = report();
        // Same heading twice on one page.
        pages[2] = page(
            2,
            &[
                ("2. Approach", 100.0, 16.0),
                (BODY, 130.0, 11.0),
                ("2. Approach", 300.0, 16.0),
            ],
        );

        let outline = extractor().extract(&pages);
        let keys: Vec<(usize, &str)> = outline
            .outline
            .iter()
            .map(|h| (h.page, h.text.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_by_key(|&(p, _)| p);
        assert_eq!(keys, sorted);
        assert_eq!(keys.iter().filter(|&&k| k == (2, "2. Approach")).count(), 1);
    }

    #[test]
    fn test_running_header_partially_matching_title() {
        let mut pages = report();
        pages[1] = page(
            1,
            &[
                ("Strategy Digital Library Plan", 40.0, 16.0),
                ("1. Introduction", 100.0, 16.0),
                (BODY, 130.0, 11.0),
            ],
        );

        let outline = extractor().extract(&pages);
        let texts: Vec<&str> = outline.outline.iter().map(|h| h.text.as_str()).collect();
        // Three of four words overlap, below the title-component threshold.
        assert!(texts.contains(&"Strategy Digital Library Plan"));
        assert!(!texts.contains(&"Digital Library Strategy"));
    }

    #[test]
    fn test_custom_overlap_ratio_absorbs_running_header() {
        let mut config = ExtractorConfig::default();
        config.heading.title_overlap_ratio = 0.75;
        let ex = OutlineExtractor::new(config).unwrap();

        let mut pages = report();
        pages[1] = page(
            1,
            &[
                ("Strategy Digital Library Plan", 40.0, 16.0),
                ("1. Introduction", 100.0, 16.0),
                (BODY, 130.0, 11.0),
            ],
        );

        let outline = ex.extract(&pages);
        assert!(outline
            .outline
            .iter()
            .all(|h| h.text != "Strategy Digital Library Plan"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut config = ExtractorConfig::default();
        config.noise.patterns.push("[".to_string());
        assert!(OutlineExtractor::new(config).is_err());
    }

    #[test]
    fn test_wrapped_title_line_not_in_outline() {
        // Both title lines share one block so they group into one candidate.
        let mut first = page(
            0,
            &[
                ("Strategic", 80.0, 24.0),
                ("Planning Guide", 106.0, 24.0),
                (BODY, 200.0, 11.0),
            ],
        );
        let rows = first.blocks.drain(..).flat_map(|b| b.rows).collect();
        first.blocks = vec![Block { rows }];

        let outline = extractor().extract(&[first]);
        assert_eq!(outline.title, "Strategic Planning Guide");
        assert!(outline.outline.is_empty());
    }

    #[test]
    fn test_heading_merged_into_title_text_dropped() {
        let pages = vec![
            page(0, &[("Quarterly Results", 90.0, 28.0), (BODY, 200.0, 11.0)]),
            page(
                1,
                &[
                    ("Quarterly", 100.0, 18.0),
                    ("Results", 115.0, 18.0),
                    (BODY, 140.0, 11.0),
                    ("1. Revenue", 300.0, 18.0),
                ],
            ),
        ];

        let outline = extractor().extract(&pages);
        assert_eq!(outline.title, "Quarterly Results");
        assert_eq!(
            outline.outline,
            vec![heading(HeadingLevel::H1, "1. Revenue", 1)]
        );
    }
}
