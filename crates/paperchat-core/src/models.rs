//! Core data types that flow through ingestion and retrieval.

use serde::Serialize;

/// An uploaded PDF. The name is the deduplication key.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// An ordered segment of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    /// Name of the document this chunk was cut from.
    pub document_name: String,
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// A chunk together with its embedding vector, as persisted in the index.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A stored chunk returned by similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub id: String,
    pub document_name: String,
    pub chunk_index: i64,
    pub text: String,
    /// Cosine similarity to the query, in `[-1.0, 1.0]`.
    pub score: f64,
}

/// Per-document bookkeeping kept alongside the records.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub chunk_count: i64,
    /// Unix timestamp of the batch that ingested the document.
    pub ingested_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the in-session conversation. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Chunk texts the answer was grounded on (assistant turns only).
    pub sources: Vec<String>,
    /// True when this assistant turn records a failed answer.
    pub failed: bool,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
            failed: false,
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
            failed: false,
        }
    }

    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources: Vec::new(),
            failed: true,
        }
    }
}
