//! Error taxonomy shared by ingestion, retrieval and answering.
//!
//! Each variant carries a message meant to be shown to the end user as-is.

use thiserror::Error;

/// Top-level error for paperchat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A document could not be parsed or yielded no text.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A chunk batch could not be embedded or persisted.
    #[error("index write error: {0}")]
    IndexWrite(#[from] IndexWriteError),

    /// A question was asked before any document was processed.
    #[error("please upload and process at least one PDF document before asking questions")]
    RetrievalPrecondition,

    /// The answer model failed for this question.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// The query could not be embedded or the index could not be read.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown answer model '{0}'")]
    UnknownModel(String),

    #[error("question must not be empty")]
    EmptyQuery,

    /// The index storage could not be opened, read or cleared.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Text extraction failures. Recovered per document during ingestion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("error reading PDF: {0}")]
    Parse(String),

    #[error("no text could be extracted from the PDF; the document might be an image-only PDF")]
    NoText,
}

/// Failures writing a chunk batch to the vector index.
#[derive(Error, Debug)]
pub enum IndexWriteError {
    #[error("no texts provided to add to the vector index")]
    EmptyBatch,

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedding dimension mismatch: index expects {expected}, provider returned {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("storage write failed: {0}")]
    Storage(String),
}

/// Answer generator failures. Recoverable per question.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("answer model unavailable: {0}")]
    Unavailable(String),

    #[error("malformed answer model response: {0}")]
    Malformed(String),
}

/// Result alias for paperchat core operations.
pub type Result<T> = std::result::Result<T, Error>;
