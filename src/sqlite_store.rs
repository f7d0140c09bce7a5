//! SQLite-backed [`Store`] implementation.
//!
//! The index lives in `<persist_directory>/index.sqlite` with four tables:
//! `documents`, `chunks`, `chunk_vectors` and `index_meta`. Vector search
//! loads every vector and ranks by cosine similarity in process.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, warn};

use paperchat_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use paperchat_core::models::{DocumentSummary, EmbeddingRecord, ScoredChunk};
use paperchat_core::store::{IndexMeta, Store};

use crate::db;
use crate::migrate;

const META_MODEL: &str = "embedding_model";
const META_DIMS: &str = "embedding_dims";

/// SQLite implementation of the [`Store`] trait.
///
/// Holds the only connection to the index file for as long as it lives.
pub struct SqliteStore {
    dir: PathBuf,
    pool: RwLock<SqlitePool>,
}

impl SqliteStore {
    /// Open (or create) the index in `persist_directory`.
    ///
    /// Fails with "in use by another process" when another store holds it.
    pub async fn open(persist_directory: &Path) -> Result<Self> {
        let pool = open_pool(persist_directory).await?;
        Ok(Self {
            dir: persist_directory.to_path_buf(),
            pool: RwLock::new(pool),
        })
    }

    /// Delete `persist_directory` and open an empty index in its place.
    ///
    /// An index that cannot be opened (corrupt or unreadable file) is deleted
    /// without being opened. An index held by another process is left alone.
    pub async fn recreate(persist_directory: &Path) -> Result<Self> {
        match try_open_pool(persist_directory).await {
            Ok(pool) => {
                let store = Self {
                    dir: persist_directory.to_path_buf(),
                    pool: RwLock::new(pool),
                };
                store.reset().await?;
                Ok(store)
            }
            Err(e) if db::is_locked(&e) => Err(db::explain_locked(e, persist_directory)),
            Err(e) => {
                warn!(
                    dir = %persist_directory.display(),
                    "index could not be opened, deleting it: {:#}",
                    e
                );
                remove_index_dir(persist_directory)?;
                Self::open(persist_directory).await
            }
        }
    }

    /// Release the index file. The next call on the store reopens it.
    pub async fn close(&self) {
        self.pool.read().await.close().await;
    }

    /// The open pool, reopened first if an earlier close or failed reset
    /// left it closed.
    async fn live_pool(&self) -> Result<RwLockReadGuard<'_, SqlitePool>> {
        {
            let pool = self.pool.read().await;
            if !pool.is_closed() {
                return Ok(pool);
            }
        }

        let mut pool = self.pool.write().await;
        if pool.is_closed() {
            *pool = open_pool(&self.dir).await?;
            debug!(dir = %self.dir.display(), "reopened index");
        }
        Ok(pool.downgrade())
    }
}

async fn try_open_pool(dir: &Path) -> Result<SqlitePool> {
    let pool = db::connect(dir).await?;
    migrate::run_migrations(&pool).await?;
    db::claim_writer(&pool).await?;
    Ok(pool)
}

async fn open_pool(dir: &Path) -> Result<SqlitePool> {
    try_open_pool(dir)
        .await
        .map_err(|e| db::explain_locked(e, dir))
}

fn remove_index_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to delete index directory: {}", dir.display()))?;
    }
    Ok(())
}

async fn read_meta(pool: &SqlitePool) -> Result<Option<IndexMeta>> {
    let rows = sqlx::query("SELECT key, value FROM index_meta WHERE key IN (?, ?)")
        .bind(META_MODEL)
        .bind(META_DIMS)
        .fetch_all(pool)
        .await?;

    let mut model = None;
    let mut dims = None;
    for row in rows {
        let key: String = row.get("key");
        let value: String = row.get("value");
        match key.as_str() {
            META_MODEL => model = Some(value),
            META_DIMS => {
                dims = Some(
                    value
                        .parse::<usize>()
                        .with_context(|| format!("corrupt index_meta dims: {}", value))?,
                )
            }
            _ => {}
        }
    }

    match (model, dims) {
        (Some(model), Some(dims)) => Ok(Some(IndexMeta { model, dims })),
        (None, None) => Ok(None),
        _ => bail!("index_meta is incomplete; clear the index"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn index_meta(&self) -> Result<Option<IndexMeta>> {
        let pool = self.live_pool().await?;
        read_meta(&pool).await
    }

    async fn insert_records(&self, meta: &IndexMeta, records: &[EmbeddingRecord]) -> Result<()> {
        let pool = self.live_pool().await?;

        match read_meta(&pool).await? {
            Some(existing) if &existing != meta => bail!(
                "index was built with {} ({} dims), refusing records from {} ({} dims)",
                existing.model,
                existing.dims,
                meta.model,
                meta.dims
            ),
            _ => {}
        }
        if let Some(bad) = records.iter().find(|r| r.vector.len() != meta.dims) {
            bail!(
                "record {} has {} dims, expected {}",
                bad.chunk.id,
                bad.vector.len(),
                meta.dims
            );
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = pool.begin().await?;

        for (key, value) in [(META_MODEL, meta.model.clone()), (META_DIMS, meta.dims.to_string())] {
            sqlx::query(
                "INSERT INTO index_meta (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        for record in records {
            let chunk = &record.chunk;

            sqlx::query(
                r#"
                INSERT INTO documents (name, chunk_count, ingested_at)
                VALUES (?, 1, ?)
                ON CONFLICT(name) DO UPDATE SET chunk_count = chunk_count + 1
                "#,
            )
            .bind(&chunk.document_name)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO chunks (id, document_name, chunk_index, text, hash) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.document_name)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO chunk_vectors (chunk_id, embedding) VALUES (?, ?)")
                .bind(&chunk.id)
                .bind(vec_to_blob(&record.vector))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(records = records.len(), "committed batch");
        Ok(())
    }

    async fn vector_search(&self, query_vec: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let pool = self.live_pool().await?;
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.document_name, c.chunk_index, c.text, cv.embedding
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            ORDER BY c.rowid
            "#,
        )
        .fetch_all(&*pool)
        .await?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                ScoredChunk {
                    id: row.get("id"),
                    document_name: row.get("document_name"),
                    chunk_index: row.get("chunk_index"),
                    text: row.get("text"),
                    score: cosine_similarity(query_vec, &vec) as f64,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn documents(&self) -> Result<Vec<DocumentSummary>> {
        let pool = self.live_pool().await?;
        let rows = sqlx::query(
            "SELECT name, chunk_count, ingested_at FROM documents ORDER BY name ASC",
        )
        .fetch_all(&*pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DocumentSummary {
                name: row.get("name"),
                chunk_count: row.get("chunk_count"),
                ingested_at: row.get("ingested_at"),
            })
            .collect())
    }

    async fn count_records(&self) -> Result<i64> {
        let pool = self.live_pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
            .fetch_one(&*pool)
            .await?;
        Ok(count)
    }

    /// Close the database, delete the persist directory and start empty.
    ///
    /// If the delete or the reopen fails the pool stays closed, and the next
    /// call reopens whatever is left on disk.
    async fn reset(&self) -> Result<()> {
        let mut pool = self.pool.write().await;
        pool.close().await;

        remove_index_dir(&self.dir)?;

        *pool = open_pool(&self.dir)
            .await
            .map_err(|e| anyhow!("index was deleted but could not be recreated: {:#}", e))?;
        Ok(())
    }
}
