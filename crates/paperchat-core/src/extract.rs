//! Text extraction seam.
//!
//! The core crate does not parse PDFs itself. The app supplies a
//! [`TextExtractor`] backed by a PDF library; tests supply fakes.

use async_trait::async_trait;

use crate::error::ExtractionError;

/// Turns raw document bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page, in page order, joined with `"\n"`.
    ///
    /// Fails with [`ExtractionError::Parse`] when the bytes are not a
    /// readable document and [`ExtractionError::NoText`] when no page
    /// yields any non-whitespace text.
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Join per-page text the way every extractor should: pages without
/// non-whitespace content are skipped, the rest joined with `"\n"`.
pub fn join_pages<I, S>(pages: I) -> Result<String, ExtractionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let kept: Vec<S> = pages
        .into_iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .collect();
    if kept.is_empty() {
        return Err(ExtractionError::NoText);
    }
    Ok(kept
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n"))
}
