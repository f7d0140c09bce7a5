//! # paperchat core
//!
//! Runtime-agnostic logic for paperchat: the document and chunk model, the
//! recursive character splitter, the vector index built on a pluggable
//! [`store::Store`], the ingestion coordinator, retrieval, and the
//! [`session::Session`] that ties them together for question answering.
//!
//! This crate contains no tokio, sqlx, HTTP clients, or filesystem I/O.
//! Everything that touches the outside world (PDF parsing, embedding models,
//! language models, durable storage) is injected through a trait:
//!
//! | Capability | Trait |
//! |------------|-------|
//! | PDF → text | [`extract::TextExtractor`] |
//! | text → vector | [`embedding::EmbeddingProvider`] |
//! | record persistence | [`store::Store`] |
//! | question + context → answer | [`answer::AnswerGenerator`] |

pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod models;
pub mod search;
pub mod session;
pub mod store;

pub use error::{Error, ExtractionError, GenerationError, IndexWriteError, Result};
