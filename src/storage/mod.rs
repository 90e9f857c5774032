//! Storage module for persisting crawled listings
//!
//! This module handles:
//! - The `(tenant, url)` dedup index consulted before fetching
//! - Idempotent upserts of crawl results
//! - Two interchangeable backends: a keyed table ([`TableStore`]) and an
//!   append-only JSON-lines file ([`LocalFileStore`])

mod file;
mod memory;
mod sqlite;
mod table;
mod traits;

pub use file::LocalFileStore;
pub use memory::MemoryTableClient;
pub use sqlite::SqliteTableClient;
pub use table::{validate_table_name, TableStore};
pub use traits::{
    KeySchema, PersistenceStore, StorageError, StorageResult, TableClient, TableItem,
    LISTING_KEY_SCHEMA,
};

use crate::config::{BackendKind, StorageConfig};
use crate::extract::Property;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// One crawled detail page
///
/// Serialized field names are the stored record format shared by both
/// backends: `{name, url, markdown, property?, created_at, updated_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    #[serde(rename = "name")]
    pub tenant: String,

    pub url: String,

    /// Page content as markdown, or its SHA-256 digest in content hashing mode
    #[serde(rename = "markdown")]
    pub raw_content: String,

    #[serde(rename = "property", default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<Property>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Creates a result stamped with the current time
    pub fn new(
        tenant: impl Into<String>,
        url: impl Into<String>,
        raw_content: impl Into<String>,
        extracted: Option<Property>,
    ) -> Self {
        let now = Utc::now();
        Self {
            tenant: tenant.into(),
            url: url.into(),
            raw_content: raw_content.into(),
            extracted,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy whose content is replaced by its digest
    pub fn with_hashed_content(&self) -> Self {
        Self {
            raw_content: content_digest(&self.raw_content),
            ..self.clone()
        }
    }
}

/// Hex SHA-256 of the UTF-8 bytes of `content`
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Opens the backend selected in the storage configuration, bound to `tenant`
///
/// For the table backend this ensures the destination table exists before
/// returning.
///
/// # Errors
///
/// * `StorageError::Setup` - The table could not be created
/// * `StorageError::Sqlite` - The database file could not be opened
pub async fn open_store(
    config: &StorageConfig,
    tenant: &str,
) -> StorageResult<Arc<dyn PersistenceStore>> {
    match config.backend {
        BackendKind::Table => {
            let table = config.table_name.as_deref().ok_or_else(|| {
                StorageError::Setup("table-name is required for the table backend".to_string())
            })?;
            let client = SqliteTableClient::open(Path::new(&config.database_path))?;
            let store = TableStore::open(client, table, tenant, config.hash_content).await?;
            Ok(Arc::new(store))
        }
        BackendKind::File => {
            let path = config.output_file.as_deref().ok_or_else(|| {
                StorageError::Setup("output-file is required for the file backend".to_string())
            })?;
            Ok(Arc::new(LocalFileStore::new(
                path,
                tenant,
                config.hash_content,
            )))
        }
    }
}
