//! SQLite-backed document store.
//!
//! Documents are stored whole as JSON text. The table is created on connect if
//! it does not exist; there is no other schema.
use crate::DocumentStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// A document read back from the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub collection: String,
    pub document: Value,
    pub inserted_at: DateTime<Utc>,
}

pub struct SqliteDocumentStore {
    pool: SqlitePool,
    database: String,
}

impl SqliteDocumentStore {
    /// Open (creating if missing) the SQLite file at `url` and scope all
    /// reads and writes to the logical `database` name.
    pub async fn connect(url: &str, database: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url: {url}"))?
            .create_if_missing(true);
        // A single connection keeps `sqlite::memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .context("failed to open document store")?;

        ensure_schema(&pool).await?;
        debug!(database, "store.connected");

        Ok(Self {
            pool,
            database: database.to_string(),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Every document of `collection`, oldest first.
    pub async fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT id, collection, body, inserted_at
            FROM documents
            WHERE db_name = ? AND collection = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(&self.database)
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<StoredDocument> {
                let body: String = row.try_get("body")?;
                Ok(StoredDocument {
                    id: row.try_get("id")?,
                    collection: row.try_get("collection")?,
                    document: serde_json::from_str(&body)
                        .context("stored document is not valid JSON")?,
                    inserted_at: row.try_get("inserted_at")?,
                })
            })
            .collect()
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert_one(&self, collection: &str, document: &Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(document)?;

        let res = sqlx::query(
            r#"
            INSERT INTO documents (id, db_name, collection, body, inserted_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&self.database)
        .bind(collection)
        .bind(&body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert into {}.{collection} failed", self.database))?;

        info!(
            id = %id,
            database = %self.database,
            collection,
            bytes = body.len(),
            rows_affected = res.rows_affected(),
            "store.insert_one"
        );
        Ok(id)
    }
}

async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            db_name     TEXT NOT NULL,
            collection  TEXT NOT NULL,
            body        TEXT NOT NULL,
            inserted_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create documents table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents (db_name, collection)",
    )
    .execute(pool)
    .await
    .context("failed to create documents index")?;

    Ok(())
}

/// Connect, insert one document, and close again.
pub async fn send_to_store(
    url: &str,
    database: &str,
    collection: &str,
    document: &Value,
) -> Result<String> {
    let store = SqliteDocumentStore::connect(url, database).await?;
    let inserted = store.insert_one(collection, document).await;
    store.close().await;
    inserted
}
