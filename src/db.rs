use anyhow::{anyhow, Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqliteLockingMode, SqlitePool, SqlitePoolOptions,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const INDEX_FILE: &str = "index.sqlite";

pub fn index_path(persist_directory: &Path) -> PathBuf {
    persist_directory.join(INDEX_FILE)
}

/// Open the index database inside `persist_directory`, creating both if needed.
///
/// The single connection runs in exclusive locking mode: once it has written,
/// no other process can read or write the file until it is closed.
pub async fn connect(persist_directory: &Path) -> Result<SqlitePool> {
    std::fs::create_dir_all(persist_directory).with_context(|| {
        format!(
            "Failed to create index directory: {}",
            persist_directory.display()
        )
    })?;

    let options = SqliteConnectOptions::new()
        .filename(index_path(persist_directory))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .locking_mode(SqliteLockingMode::Exclusive)
        .busy_timeout(Duration::from_secs(1));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Write to the database so the exclusive lock is taken now rather than on
/// the first ingest.
pub async fn claim_writer(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO index_meta (key, value) VALUES ('opened_at', ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(chrono::Utc::now().timestamp().to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// True when `err` was caused by another connection holding the lock.
pub fn is_locked(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains("database is locked"))
}

/// Replace a lock error with a message naming the contended directory.
pub fn explain_locked(err: anyhow::Error, persist_directory: &Path) -> anyhow::Error {
    if is_locked(&err) {
        anyhow!(
            "index at {} is in use by another process",
            persist_directory.display()
        )
    } else {
        err
    }
}
