//! Snippet extraction from a single document.
//!
//! - [`markdown`]: fenced code blocks via `pulldown-cmark`
//! - [`html`]: attributed elements via `scraper`

pub mod html;
pub mod markdown;

use std::path::Path;

use crate::domain::{Code, FileType, Result};

/// Pulls code units out of one document.
///
/// Implementations must not fail on documents with unexpected structure;
/// they yield fewer (or zero) code units instead. Only I/O failures are
/// errors.
pub trait SnippetExtractor: Send + Sync {
    /// Code units in `path`, in document order.
    fn extract(&self, path: &Path, file_type: FileType, attributes: &[String])
        -> Result<Vec<Code>>;
}

/// Default extractor dispatching on [`FileType`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl SnippetExtractor for DocumentExtractor {
    fn extract(
        &self,
        path: &Path,
        file_type: FileType,
        attributes: &[String],
    ) -> Result<Vec<Code>> {
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8_lossy(&bytes);
        let codes = match file_type {
            FileType::Markdown => markdown::extract(&source, attributes),
            FileType::Html => html::extract(&source, attributes),
        };
        Ok(codes)
    }
}
