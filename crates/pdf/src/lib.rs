//! PDF reading for pdfoutline.
//!
//! Loads a document with lopdf and emits the page stream (`outline_core::Page`)
//! the classifier works on. Page indices are 0-based and coordinates are
//! top-origin.

use std::path::Path;

use outline_core::{DocumentOutline, OutlineExtractor, Page};
use serde::Serialize;
use thiserror::Error;

use parser::backend::LopdfBackend;

pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trailer metadata and page count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
}

/// A loaded PDF document.
pub struct ParsedDocument {
    backend: LopdfBackend,
}

impl ParsedDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(ParsedDocument {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// The page stream of the whole document.
    pub fn pages(&self) -> Vec<Page> {
        parser::layout::extract_pages(&self.backend)
    }

    pub fn info(&self) -> DocumentInfo {
        let mut raw = self.backend.metadata();
        let mut take = |key: &str| raw.remove(key).filter(|v| !v.trim().is_empty());
        DocumentInfo {
            title: take("Title"),
            author: take("Author"),
            creator: take("Creator"),
            producer: take("Producer"),
            page_count: self.backend.page_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions
// ---------------------------------------------------------------------------

/// Parse PDF bytes into the page stream.
pub fn load_pages(bytes: &[u8]) -> Result<Vec<Page>, PdfError> {
    Ok(ParsedDocument::from_bytes(bytes)?.pages())
}

/// Parse PDF bytes and run the extractor over them.
pub fn extract_outline(
    bytes: &[u8],
    extractor: &OutlineExtractor,
) -> Result<DocumentOutline, PdfError> {
    let pages = load_pages(bytes)?;
    Ok(extractor.extract(&pages))
}

/// Document metadata without reading any page content.
pub fn info(bytes: &[u8]) -> Result<DocumentInfo, PdfError> {
    Ok(ParsedDocument::from_bytes(bytes)?.info())
}
