pub mod grid;
pub mod pdftotext;

use std::path::Path;

use crate::error::CardError;

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from a PDF on disk, one PageContent per page.
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<PageContent>, CardError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
