//! PDF text extraction.
//!
//! Wraps `pdf-extract`'s page-by-page API behind the core
//! [`TextExtractor`] trait. Parsing runs on the blocking pool; a panic
//! inside the parser is reported as a parse error for that document.

use async_trait::async_trait;

use paperchat_core::extract::{join_pages, TextExtractor};
use paperchat_core::ExtractionError;

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let bytes = bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| ExtractionError::Parse(e.to_string()))
        })
        .await
        .map_err(|e| ExtractionError::Parse(format!("PDF parser crashed: {}", e)))??;

        join_pages(pages)
    }
}
