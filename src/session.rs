//! Wiring from [`Config`] to a ready [`Session`].

use std::sync::Arc;

use anyhow::Result;

use paperchat_core::chunk::TextSplitter;
use paperchat_core::index::VectorIndex;
use paperchat_core::session::{Session, SessionSettings};

use crate::config::Config;
use crate::embedding::create_provider;
use crate::extract::PdfExtractor;
use crate::generate::OllamaGenerator;
use crate::sqlite_store::SqliteStore;

pub type PaperSession = Session<SqliteStore>;

pub fn session_settings(config: &Config) -> Result<SessionSettings> {
    Ok(SessionSettings {
        splitter: TextSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?,
        retrieval_k: config.retrieval.k,
        answer_model: config.answer.model.clone(),
        available_models: config.answer.available_models.clone(),
    })
}

/// Open the persisted index with the configured embedding provider.
pub async fn open_index(config: &Config) -> Result<VectorIndex<SqliteStore>> {
    let embedder = create_provider(&config.embedding)?;
    let store = SqliteStore::open(&config.index.persist_directory).await?;
    let index = VectorIndex::open(store, embedder, config.embedding.batch_size).await?;
    Ok(index)
}

/// Open a session on the persisted index.
pub async fn open_session(config: &Config) -> Result<PaperSession> {
    let index = open_index(config).await?;
    let session = Session::open(
        index,
        Arc::new(PdfExtractor::new()),
        Arc::new(OllamaGenerator::new(&config.answer)?),
        session_settings(config)?,
    )
    .await?;
    Ok(session)
}
