//! Storage abstraction for the vector index.
//!
//! The [`Store`] trait is everything the [`VectorIndex`](crate::index::VectorIndex)
//! needs from a backend: atomic batch inserts, brute-force similarity search,
//! per-document bookkeeping, and a full reset. The app crate provides a
//! SQLite implementation; [`memory::InMemoryStore`] backs tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DocumentSummary, EmbeddingRecord, ScoredChunk};

/// The embedding model an index was built with. Recorded on first insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    pub model: String,
    pub dims: usize,
}

/// Abstract storage backend for embedding records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`index_meta`](Store::index_meta) | Model and dims the index was built with |
/// | [`insert_records`](Store::insert_records) | Persist a batch, all or nothing |
/// | [`vector_search`](Store::vector_search) | Cosine similarity search |
/// | [`documents`](Store::documents) | Documents with their chunk counts |
/// | [`count_records`](Store::count_records) | Total stored records |
/// | [`reset`](Store::reset) | Drop every record and the index metadata |
#[async_trait]
pub trait Store: Send + Sync {
    async fn index_meta(&self) -> Result<Option<IndexMeta>>;

    /// Persist a batch of records atomically.
    ///
    /// Either every record becomes visible to search or none does. The first
    /// successful insert into an empty index records `meta`.
    async fn insert_records(&self, meta: &IndexMeta, records: &[EmbeddingRecord]) -> Result<()>;

    /// Return up to `limit` records ordered by descending cosine similarity.
    /// Ties keep insertion order.
    async fn vector_search(&self, query_vec: &[f32], limit: usize) -> Result<Vec<ScoredChunk>>;

    async fn documents(&self) -> Result<Vec<DocumentSummary>>;

    async fn count_records(&self) -> Result<i64>;

    async fn reset(&self) -> Result<()>;
}
