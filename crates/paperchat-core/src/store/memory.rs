//! In-memory [`Store`] implementation for tests and ephemeral sessions.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`. Vector search is
//! brute-force cosine similarity over every stored vector.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{DocumentSummary, EmbeddingRecord, ScoredChunk};

use super::{IndexMeta, Store};

#[derive(Default)]
struct Inner {
    meta: Option<IndexMeta>,
    records: Vec<EmbeddingRecord>,
    ingested_at: BTreeMap<String, i64>,
}

/// In-memory store. Contents are lost when it is dropped.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn index_meta(&self) -> Result<Option<IndexMeta>> {
        Ok(self.read()?.meta.clone())
    }

    async fn insert_records(&self, meta: &IndexMeta, records: &[EmbeddingRecord]) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(existing) = &inner.meta {
            if existing != meta {
                return Err(anyhow!(
                    "index was built with {} ({} dims), refusing records from {} ({} dims)",
                    existing.model,
                    existing.dims,
                    meta.model,
                    meta.dims
                ));
            }
        }
        if let Some(bad) = records.iter().find(|r| r.vector.len() != meta.dims) {
            return Err(anyhow!(
                "record {} has {} dims, expected {}",
                bad.chunk.id,
                bad.vector.len(),
                meta.dims
            ));
        }

        let now = chrono::Utc::now().timestamp();
        inner.meta = Some(meta.clone());
        for record in records {
            inner
                .ingested_at
                .entry(record.chunk.document_name.clone())
                .or_insert(now);
        }
        inner.records.extend(records.iter().cloned());
        Ok(())
    }

    async fn vector_search(&self, query_vec: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let inner = self.read()?;
        let mut scored: Vec<ScoredChunk> = inner
            .records
            .iter()
            .map(|r| ScoredChunk {
                id: r.chunk.id.clone(),
                document_name: r.chunk.document_name.clone(),
                chunk_index: r.chunk.chunk_index,
                text: r.chunk.text.clone(),
                score: cosine_similarity(query_vec, &r.vector) as f64,
            })
            .collect();
        // stable sort keeps insertion order among ties
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn documents(&self) -> Result<Vec<DocumentSummary>> {
        let inner = self.read()?;
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for r in &inner.records {
            *counts.entry(r.chunk.document_name.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, chunk_count)| DocumentSummary {
                name: name.to_string(),
                chunk_count,
                ingested_at: inner.ingested_at.get(name).copied().unwrap_or_default(),
            })
            .collect())
    }

    async fn count_records(&self) -> Result<i64> {
        Ok(self.read()?.records.len() as i64)
    }

    async fn reset(&self) -> Result<()> {
        *self.write()? = Inner::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn record(doc: &str, idx: i64, text: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            chunk: Chunk {
                id: format!("{}-{}", doc, idx),
                document_name: doc.to_string(),
                chunk_index: idx,
                text: text.to_string(),
                hash: String::new(),
            },
            vector,
        }
    }

    fn meta(dims: usize) -> IndexMeta {
        IndexMeta {
            model: "test".to_string(),
            dims,
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = InMemoryStore::new();
        store
            .insert_records(
                &meta(2),
                &[
                    record("a.pdf", 0, "x axis", vec![1.0, 0.0]),
                    record("a.pdf", 1, "y axis", vec![0.0, 1.0]),
                    record("b.pdf", 0, "diagonal", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store.vector_search(&[0.0, 1.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "y axis");
        assert_eq!(hits[1].text, "diagonal");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = InMemoryStore::new();
        store
            .insert_records(
                &meta(2),
                &[
                    record("a.pdf", 0, "first", vec![1.0, 0.0]),
                    record("a.pdf", 1, "second", vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();
        let hits = store.vector_search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits[0].text, "first");
        assert_eq!(hits[1].text, "second");
    }

    #[tokio::test]
    async fn test_rejects_mixed_models_and_bad_dims() {
        let store = InMemoryStore::new();
        store
            .insert_records(&meta(2), &[record("a.pdf", 0, "x", vec![1.0, 0.0])])
            .await
            .unwrap();

        let other = IndexMeta {
            model: "other".to_string(),
            dims: 2,
        };
        assert!(store
            .insert_records(&other, &[record("b.pdf", 0, "y", vec![0.0, 1.0])])
            .await
            .is_err());
        assert!(store
            .insert_records(&meta(2), &[record("b.pdf", 0, "y", vec![0.0])])
            .await
            .is_err());
        assert_eq!(store.count_records().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_documents_and_reset() {
        let store = InMemoryStore::new();
        store
            .insert_records(
                &meta(1),
                &[
                    record("b.pdf", 0, "b0", vec![1.0]),
                    record("a.pdf", 0, "a0", vec![1.0]),
                    record("a.pdf", 1, "a1", vec![1.0]),
                ],
            )
            .await
            .unwrap();

        let docs = store.documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "a.pdf");
        assert_eq!(docs[0].chunk_count, 2);
        assert_eq!(docs[1].name, "b.pdf");

        store.reset().await.unwrap();
        assert_eq!(store.count_records().await.unwrap(), 0);
        assert!(store.index_meta().await.unwrap().is_none());
        assert!(store.documents().await.unwrap().is_empty());
    }
}
