//! Final cleanup of detected headings.

use std::collections::HashSet;

use crate::types::{DetectedHeading, DetectedLevel, Heading};

/// Turn detected headings into the published outline.
///
/// Title-equivalent entries are dropped, repeated `(text, page)` pairs keep
/// their first occurrence, and the result is stably ordered by page so
/// entries on one page stay in detection order.
pub fn clean_and_sort(detected: Vec<DetectedHeading>) -> Vec<Heading> {
    let mut seen: HashSet<(String, usize)> = HashSet::new();
    let mut headings: Vec<Heading> = detected
        .into_iter()
        .filter_map(|h| match h.level {
            DetectedLevel::Heading(level) => Some(Heading {
                level,
                text: h.text,
                page: h.page,
            }),
            DetectedLevel::TitleEquivalent => None,
        })
        .filter(|h| seen.insert((h.text.clone(), h.page)))
        .collect();

    headings.sort_by_key(|h| h.page);
    headings
}
