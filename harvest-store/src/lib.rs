//! Document-store sink for harvest runs.
//!
//! A run ends by writing exactly one [`RunRecord`] into one collection. The
//! [`DocumentStore`] trait is the seam; [`SqliteDocumentStore`] keeps documents as
//! JSON text in a single `documents` table keyed by logical database and
//! collection name.
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod record;
pub mod sqlite;

pub use record::RunRecord;
pub use sqlite::{send_to_store, SqliteDocumentStore, StoredDocument};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one new document and return its generated id. Never upserts.
    async fn insert_one(&self, collection: &str, document: &Value) -> Result<String>;
}
