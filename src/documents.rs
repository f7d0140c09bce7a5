//! `paperchat documents`: what the index holds.

use anyhow::Result;
use chrono::{TimeZone, Utc};

use paperchat_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// List processed documents with their chunk counts.
///
/// Reads the store directly so an index built with a different embedding
/// model can still be inspected.
pub async fn run_documents(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.index.persist_directory).await?;
    let documents = store.documents().await?;
    let total = store.count_records().await?;
    let meta = store.index_meta().await?;
    store.close().await;

    println!("Index:       {}", db::index_path(&config.index.persist_directory).display());
    match meta {
        Some(meta) => println!("Embeddings:  {} ({} dims)", meta.model, meta.dims),
        None => println!("Embeddings:  (none yet)"),
    }
    println!("Documents:   {}", documents.len());
    println!("Chunks:      {}", total);

    if documents.is_empty() {
        return Ok(());
    }

    println!();
    for doc in &documents {
        let when = Utc
            .timestamp_opt(doc.ingested_at, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<40} {:>6} chunks  {}", doc.name, doc.chunk_count, when);
    }
    Ok(())
}
