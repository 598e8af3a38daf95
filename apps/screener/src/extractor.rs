//! Text Extractor: turns a résumé PDF into plain text, page by page.
//!
//! Failures never escape this module: an unreadable document and a document
//! without a text layer both come back as an empty string, and the pipeline
//! aborts on empty text.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A PDF handed to the extractor, either on disk or already in memory.
#[derive(Debug, Clone)]
pub enum PdfSource {
    Path(PathBuf),
    Memory(Bytes),
}

impl PdfSource {
    pub fn describe(&self) -> String {
        match self {
            PdfSource::Path(path) => path.display().to_string(),
            PdfSource::Memory(bytes) => format!("<upload, {} bytes>", bytes.len()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not read PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode PDF: {0}")]
    Decode(String),

    #[error("PDF parser panicked")]
    Panicked,
}

/// Extraction seam for the pipeline. Implementations must not fail loudly:
/// an empty string is the only failure signal.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, source: &PdfSource) -> String;
}

/// `pdf-extract` backed extractor.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, source: &PdfSource) -> String {
        match extract_pages(source) {
            Ok(pages) => {
                let page_count = pages.len();
                let text = join_pages(&pages);
                info!(
                    "Extracted {} chars from {} ({page_count} pages)",
                    text.len(),
                    source.describe()
                );
                text
            }
            Err(e) => {
                warn!("Text extraction failed for {}: {e}", source.describe());
                String::new()
            }
        }
    }
}

fn extract_pages(source: &PdfSource) -> Result<Vec<String>, ExtractError> {
    let owned;
    let bytes: &[u8] = match source {
        PdfSource::Path(path) => {
            owned = std::fs::read(path)?;
            owned.as_slice()
        }
        PdfSource::Memory(bytes) => bytes.as_ref(),
    };

    // pdf-extract panics on some malformed inputs instead of returning an error
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::Panicked)?;

    result.map_err(|e| ExtractError::Decode(e.to_string()))
}

/// Joins per-page text with single newlines. Pages without text are skipped entirely.
fn join_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for (index, page) in pages.iter().enumerate() {
        let page = page.trim();
        if page.is_empty() {
            debug!("Page {} has no extractable text", index + 1);
            continue;
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(page);
    }
    text
}
