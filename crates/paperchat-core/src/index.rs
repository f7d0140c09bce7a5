//! Vector index: embeds chunks and persists them through a [`Store`].
//!
//! The index pairs one [`EmbeddingProvider`] with one [`Store`]. Every record
//! in a store shares the provider's model and dimensionality; opening a store
//! that was built with a different model is refused.

use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{Error, IndexWriteError, Result};
use crate::models::{Chunk, DocumentSummary, EmbeddingRecord, ScoredChunk};
use crate::store::{IndexMeta, Store};

pub const DEFAULT_BATCH_SIZE: usize = 64;

pub struct VectorIndex<S: Store> {
    store: S,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl<S: Store> VectorIndex<S> {
    /// Wrap `store`, checking it was built with the same embedding model.
    pub async fn open(
        store: S,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Result<Self> {
        let existing = store
            .index_meta()
            .await
            .map_err(|e| Error::Storage(format!("{:#}", e)))?;

        if let Some(meta) = existing {
            if meta.model != embedder.model_name() || meta.dims != embedder.dims() {
                return Err(Error::Config(format!(
                    "index was built with embedding model '{}' ({} dims) but the configured \
                     provider is '{}' ({} dims); clear the index to rebuild it",
                    meta.model,
                    meta.dims,
                    embedder.model_name(),
                    embedder.dims()
                )));
            }
        }

        Ok(Self {
            store,
            embedder,
            batch_size: batch_size.max(1),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn meta(&self) -> IndexMeta {
        IndexMeta {
            model: self.embedder.model_name().to_string(),
            dims: self.embedder.dims(),
        }
    }

    /// Embed and persist `chunks` as one all-or-nothing write.
    ///
    /// Returns the number of records added.
    pub async fn add(&self, chunks: &[Chunk]) -> std::result::Result<usize, IndexWriteError> {
        if chunks.is_empty() {
            return Err(IndexWriteError::EmptyBatch);
        }

        let expected = self.embedder.dims();
        let mut records = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .map_err(|e| IndexWriteError::Embedding(format!("{:#}", e)))?;

            if vectors.len() != batch.len() {
                return Err(IndexWriteError::Embedding(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (chunk, vector) in batch.iter().zip(vectors) {
                if vector.len() != expected {
                    return Err(IndexWriteError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                records.push(EmbeddingRecord {
                    chunk: chunk.clone(),
                    vector,
                });
            }
            debug!(embedded = records.len(), total = chunks.len(), "embedded batch");
        }

        self.store
            .insert_records(&self.meta(), &records)
            .await
            .map_err(|e| IndexWriteError::Storage(format!("{:#}", e)))?;

        info!("added {} new chunks to the vector index", records.len());
        Ok(records.len())
    }

    /// Return up to `k` stored chunks, most similar to `query` first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vectors = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| Error::Retrieval(format!("failed to embed query: {:#}", e)))?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Retrieval("provider returned no query vector".to_string()))?;
        if query_vec.len() != self.embedder.dims() {
            return Err(Error::Retrieval(format!(
                "query vector has {} dims, index expects {}",
                query_vec.len(),
                self.embedder.dims()
            )));
        }

        let mut hits = self
            .store
            .vector_search(&query_vec, k)
            .await
            .map_err(|e| Error::Retrieval(format!("{:#}", e)))?;
        hits.truncate(k);
        Ok(hits)
    }

    /// Discard every persisted record.
    pub async fn reset(&self) -> Result<()> {
        self.store
            .reset()
            .await
            .map_err(|e| Error::Storage(format!("{:#}", e)))?;
        info!("vector index cleared");
        Ok(())
    }

    pub async fn documents(&self) -> Result<Vec<DocumentSummary>> {
        self.store
            .documents()
            .await
            .map_err(|e| Error::Storage(format!("{:#}", e)))
    }

    pub async fn len(&self) -> Result<i64> {
        self.store
            .count_records()
            .await
            .map_err(|e| Error::Storage(format!("{:#}", e)))
    }
}
