//! Retrieval service.
//!
//! A query goes straight to
//! [`VectorIndex::search`] with no re-ranking, filtering or deduplication.
//! Refusing to retrieve from an empty session is the caller's job
//! (see [`Session::ask`](crate::session::Session::ask)).

use crate::error::Result;
use crate::index::VectorIndex;
use crate::models::ScoredChunk;
use crate::store::Store;

pub const DEFAULT_K: usize = 4;

/// Return up to `k` chunks ranked by similarity to `query`, closest first.
pub async fn retrieve<S: Store>(
    index: &VectorIndex<S>,
    query: &str,
    k: usize,
) -> Result<Vec<ScoredChunk>> {
    index.search(query, k).await
}

/// Chunk texts of `hits`, in rank order.
pub fn context_texts(hits: &[ScoredChunk]) -> Vec<String> {
    hits.iter().map(|h| h.text.clone()).collect()
}
