pub mod pdftotext;
pub mod table;

use crate::error::FibreSpecError;

/// A rectangular grid of optional cell strings.
pub type Table = Vec<Vec<Option<String>>>;

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    /// 1-based page index.
    pub page_number: usize,
    pub text: String,
    pub tables: Vec<Table>,
}

/// One page's extraction result. A failed page is skipped by the pipeline.
pub type PageExtraction = Result<RawPage, FibreSpecError>;

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract page text and tables from PDF bytes, one entry per page.
    ///
    /// An outer `Err` means the document could not be read at all.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, FibreSpecError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
