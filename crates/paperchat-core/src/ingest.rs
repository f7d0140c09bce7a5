//! Ingestion coordinator.
//!
//! Drives extract → chunk → embed → persist for a batch of uploaded
//! documents:
//!
//! 1. Documents whose name is already processed (or already pending in this
//!    batch) are skipped.
//! 2. Each remaining document is extracted and chunked. A failure is
//!    recorded in the report and the batch continues.
//! 3. All chunks of the batch go to the index in a single write.
//! 4. Only after that write succeeds are the document names added to the
//!    processed set.
//!
//! Deduplication is by name only: two different files with the same name
//! collide and the second is skipped.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::chunk::TextSplitter;
use crate::error::{Error, ExtractionError, IndexWriteError};
use crate::extract::TextExtractor;
use crate::index::VectorIndex;
use crate::models::{Chunk, Document};
use crate::store::Store;

/// A document that could not be ingested.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub name: String,
    pub error: ExtractionError,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Newly processed documents, in upload order.
    pub processed: Vec<String>,
    /// Documents skipped because their name was already processed.
    pub skipped: Vec<String>,
    pub failed: Vec<IngestFailure>,
    pub chunks_added: usize,
}

impl IngestReport {
    /// True when the batch wrote nothing to the index.
    pub fn nothing_to_do(&self) -> bool {
        self.chunks_added == 0
    }
}

/// The index write for a batch failed.
///
/// `report` still lists the documents that failed extraction and the ones
/// that were skipped; `report.processed` is empty since nothing was written.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct IngestError {
    pub report: IngestReport,
    pub error: IndexWriteError,
}

impl From<IngestError> for Error {
    fn from(e: IngestError) -> Self {
        Error::IndexWrite(e.error)
    }
}

/// Ingest a batch of documents into `index`.
///
/// Returns an error only when the index write fails, in which case
/// `processed` is left untouched.
pub async fn ingest<S: Store>(
    documents: Vec<Document>,
    processed: &mut BTreeSet<String>,
    index: &VectorIndex<S>,
    extractor: &dyn TextExtractor,
    splitter: &TextSplitter,
) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    let mut pending: BTreeSet<String> = BTreeSet::new();
    let mut batch: Vec<Chunk> = Vec::new();

    for doc in documents {
        if processed.contains(&doc.name) || pending.contains(&doc.name) {
            debug!(document = %doc.name, "already processed, skipping");
            report.skipped.push(doc.name);
            continue;
        }

        let text = match extractor.extract(&doc.bytes).await {
            Ok(text) => text,
            Err(error) => {
                warn!(document = %doc.name, "{}", error);
                report.failed.push(IngestFailure {
                    name: doc.name,
                    error,
                });
                continue;
            }
        };

        let chunks = splitter.split_document(&doc.name, &text);
        if chunks.is_empty() {
            warn!(document = %doc.name, "document produced no chunks");
            report.failed.push(IngestFailure {
                name: doc.name,
                error: ExtractionError::NoText,
            });
            continue;
        }

        info!(document = %doc.name, chunks = chunks.len(), "document chunked");
        batch.extend(chunks);
        pending.insert(doc.name.clone());
        report.processed.push(doc.name);
    }

    if batch.is_empty() {
        debug!("no new documents to process");
        return Ok(report);
    }

    match index.add(&batch).await {
        Ok(added) => {
            report.chunks_added = added;
            processed.extend(pending);
            Ok(report)
        }
        Err(error) => {
            report.processed.clear();
            Err(IngestError { report, error })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::embedding::{EmbeddingProvider, HashingProvider};
    use crate::store::memory::InMemoryStore;

    /// Treats bytes as UTF-8 text; "IMAGE" stands for an image-only PDF.
    struct Utf8Extractor;

    #[async_trait]
    impl TextExtractor for Utf8Extractor {
        async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| ExtractionError::Parse(e.to_string()))?;
            if text == "IMAGE" || text.trim().is_empty() {
                return Err(ExtractionError::NoText);
            }
            Ok(text.to_string())
        }
    }

    /// Hashing embedder that counts embed calls and can be told to fail.
    struct CountingProvider {
        inner: HashingProvider,
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                inner: HashingProvider::default(),
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
        fn dims(&self) -> usize {
            self.inner.dims()
        }
        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("embedding service down");
            }
            self.inner.embed(texts).await
        }
    }

    async fn index_with(provider: Arc<CountingProvider>) -> VectorIndex<InMemoryStore> {
        VectorIndex::open(InMemoryStore::new(), provider, 64)
            .await
            .unwrap()
    }

    fn doc(name: &str, text: &str) -> Document {
        Document::new(name, text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_an_error() {
        let provider = Arc::new(CountingProvider::new(false));
        let index = index_with(provider.clone()).await;
        let mut processed = BTreeSet::new();

        let report = ingest(vec![], &mut processed, &index, &Utf8Extractor, &TextSplitter::default())
            .await
            .unwrap();

        assert_eq!(report.chunks_added, 0);
        assert!(report.nothing_to_do());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(index.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reingest_same_name_is_noop() {
        let provider = Arc::new(CountingProvider::new(false));
        let index = index_with(provider.clone()).await;
        let splitter = TextSplitter::new(40, 10).unwrap();
        let mut processed = BTreeSet::new();
        let text = "Neural networks are powerful. They require large datasets. Training takes time.";

        let first = ingest(vec![doc("paper.pdf", text)], &mut processed, &index, &Utf8Extractor, &splitter)
            .await
            .unwrap();
        assert!(first.chunks_added >= 2);
        let count = index.len().await.unwrap();
        let calls = provider.calls.load(Ordering::SeqCst);

        let second = ingest(vec![doc("paper.pdf", text)], &mut processed, &index, &Utf8Extractor, &splitter)
            .await
            .unwrap();
        assert_eq!(second.chunks_added, 0);
        assert_eq!(second.skipped, vec!["paper.pdf"]);
        assert_eq!(index.len().await.unwrap(), count);
        assert_eq!(provider.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_duplicate_name_within_batch_is_skipped() {
        let provider = Arc::new(CountingProvider::new(false));
        let index = index_with(provider).await;
        let mut processed = BTreeSet::new();

        let report = ingest(
            vec![doc("a.pdf", "first version"), doc("a.pdf", "second version")],
            &mut processed,
            &index,
            &Utf8Extractor,
            &TextSplitter::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.processed, vec!["a.pdf"]);
        assert_eq!(report.skipped, vec!["a.pdf"]);
        assert_eq!(index.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_does_not_abort_batch() {
        let provider = Arc::new(CountingProvider::new(false));
        let index = index_with(provider.clone()).await;
        let mut processed = BTreeSet::new();

        let report = ingest(
            vec![
                doc("scan.pdf", "IMAGE"),
                Document::new("broken.pdf", vec![0xff, 0xfe, 0x00]),
                doc("good.pdf", "Attention is all you need."),
            ],
            &mut processed,
            &index,
            &Utf8Extractor,
            &TextSplitter::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.processed, vec!["good.pdf"]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].name, "scan.pdf");
        assert_eq!(report.failed[0].error, ExtractionError::NoText);
        assert!(matches!(report.failed[1].error, ExtractionError::Parse(_)));
        assert!(processed.contains("good.pdf"));
        assert!(!processed.contains("scan.pdf"));
        assert!(!processed.contains("broken.pdf"));
        // one write for the whole batch
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failures_means_nothing_written() {
        let provider = Arc::new(CountingProvider::new(false));
        let index = index_with(provider.clone()).await;
        let mut processed = BTreeSet::new();

        let report = ingest(
            vec![doc("scan.pdf", "IMAGE")],
            &mut processed,
            &index,
            &Utf8Extractor,
            &TextSplitter::default(),
        )
        .await
        .unwrap();

        assert!(report.nothing_to_do());
        assert!(processed.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_processed_set_untouched() {
        let provider = Arc::new(CountingProvider::new(true));
        let index = index_with(provider).await;
        let mut processed = BTreeSet::new();

        let err = ingest(
            vec![doc("a.pdf", "some content")],
            &mut processed,
            &index,
            &Utf8Extractor,
            &TextSplitter::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err.error, IndexWriteError::Embedding(_)));
        assert!(processed.is_empty());
        assert_eq!(index.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_still_reports_extraction_failures() {
        let provider = Arc::new(CountingProvider::new(true));
        let index = index_with(provider).await;
        let mut processed = BTreeSet::from(["old.pdf".to_string()]);

        let err = ingest(
            vec![
                doc("scan.pdf", "IMAGE"),
                doc("a.pdf", "some content"),
                doc("old.pdf", "already here"),
            ],
            &mut processed,
            &index,
            &Utf8Extractor,
            &TextSplitter::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("embedding failed"));
        assert_eq!(err.report.failed.len(), 1);
        assert_eq!(err.report.failed[0].name, "scan.pdf");
        assert_eq!(err.report.failed[0].error, ExtractionError::NoText);
        assert_eq!(err.report.skipped, vec!["old.pdf"]);
        assert!(err.report.processed.is_empty());
        assert_eq!(err.report.chunks_added, 0);
        assert_eq!(processed.len(), 1);
    }
}
