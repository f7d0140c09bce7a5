//! `paperchat clear` and `paperchat init`.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Create the persist directory and an empty schema. Safe to repeat.
pub async fn run_init(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.index.persist_directory).await?;
    store.close().await;
    println!(
        "Index initialized at {}",
        db::index_path(&config.index.persist_directory).display()
    );
    Ok(())
}

/// Delete every indexed document and chunk.
///
/// Works on the store alone, so it also recovers an index built with an
/// embedding model that no longer matches the configuration, or one whose
/// file can no longer be read.
pub async fn run_clear(config: &Config) -> Result<()> {
    let dir = &config.index.persist_directory;
    let store = SqliteStore::recreate(dir).await?;
    store.close().await;
    info!(dir = %dir.display(), "cleared index");
    println!("All data cleared.");
    Ok(())
}
