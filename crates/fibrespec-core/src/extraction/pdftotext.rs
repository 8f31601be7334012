use crate::error::FibreSpecError;
use crate::extraction::table::reconstruct_tables;
use crate::extraction::{PageExtraction, PdfExtractor, RawPage};
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so column alignment survives and table grids can
/// be rebuilt from whitespace gaps.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, FibreSpecError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| FibreSpecError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| FibreSpecError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FibreSpecError::PdftotextNotFound
                } else {
                    FibreSpecError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FibreSpecError::PdftotextFailed { code, stderr });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_pages(&text);
        debug!(pages = pages.len(), "pdftotext produced pages");
        Ok(pages.into_iter().map(Ok).collect())
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split layout text on form feeds and rebuild each page's tables.
///
/// pdftotext terminates the last page with a form feed too, so a trailing
/// empty chunk is dropped.
fn split_pages(text: &str) -> Vec<RawPage> {
    let mut chunks: Vec<&str> = text.split('\x0c').collect();
    if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
        chunks.pop();
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, page_text)| RawPage {
            page_number: i + 1,
            text: page_text.to_string(),
            tables: reconstruct_tables(page_text),
        })
        .collect()
}
