//! Core library for pdfoutline
//!
//! This crate implements the **Functional Core** of the pdfoutline
//! application: it turns a stream of positioned, sized text spans into a
//! document title and an H1/H2/H3 heading outline.
//!
//! # Architecture Overview
//!
//! - **`outline_core`** (this crate): pure classification, zero I/O
//! - **`pdf`**: reads PDF files with lopdf and produces the span stream
//! - **`pdfoutline`**: the CLI (the Imperative Shell)
//!
//! Nothing in this crate touches the filesystem. Inputs are [`Page`] values
//! and the output is a [`DocumentOutline`], so every stage can be tested with
//! hand-built fixture pages.
//!
//! # Pipeline
//!
//! For one document, [`OutlineExtractor::extract`] runs:
//!
//! 1. [`FontSizeStatistics`]: font-size histogram of the first pages
//! 2. [`TitleDetector`]: score candidate line groups, pick the best one and
//!    merge nearby subtitle parts
//! 3. [`HeadingDetector`]: classify every content line, assign a level from
//!    the statistics and merge wrapped heading lines
//! 4. [`clean_and_sort`]: drop title entries, deduplicate, order by page
//!
//! [`NoiseFilter`] is consulted by steps 2 and 3 so page numbers, copyright
//! lines and version stamps never reach the result. All thresholds come from
//! [`ExtractorConfig`].
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use outline_core::{ExtractorConfig, OutlineExtractor};
//!
//! let extractor = OutlineExtractor::new(ExtractorConfig::default())?;
//! let outline = extractor.extract(&pages);
//! println!("{}", serde_json::to_string_pretty(&outline)?);
//! ```

pub mod config;
pub mod dedupe;
pub mod extractor;
pub mod heading;
pub mod noise;
pub mod stats;
pub mod text;
pub mod title;
pub mod types;

pub use config::{
    ConfigError, ExtractorConfig, HeadingConfig, NoiseConfig, StatisticsConfig, TitleConfig,
    TitleWeights,
};
pub use dedupe::clean_and_sort;
pub use extractor::{Analysis, OutlineExtractor};
pub use heading::HeadingDetector;
pub use noise::NoiseFilter;
pub use stats::{bucket, FontSizeStatistics, FONT_SIZE_BUCKET};
pub use title::{ScoreBreakdown, TitleDetector};
pub use types::{
    BBox, Block, Candidate, DetectedHeading, DetectedLevel, DocumentOutline, Heading,
    HeadingLevel, InvalidHeadingLevel, Line, Page, Row, Span, Title,
};
