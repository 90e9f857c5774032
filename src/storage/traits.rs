//! Persistence traits and error types
//!
//! This module defines the store interface the orchestrator writes through
//! and the table engine interface the keyed-table store is built on.

use crate::storage::CrawlResult;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage setup failed: {0}")]
    Setup(String),

    #[error("Failed to read stored records: {0}")]
    Read(String),

    #[error("Failed to write record: {0}")]
    Write(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of crawled listings, keyed by `(tenant, url)`
///
/// A store is bound to one tenant when it is opened. Implementations provide
/// the fallible lookup [`PersistenceStore::existing_urls`]; callers use
/// [`PersistenceStore::filter_existing`], which never fails.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Tenant whose partition this store reads and writes
    fn tenant(&self) -> &str;

    /// Returns the members of `urls` already recorded for this tenant
    async fn existing_urls(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>>;

    /// Inserts or overwrites the record for `(result.tenant, result.url)`
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend cannot persist the record; the
    /// caller decides whether to continue.
    async fn add_item(&self, result: &CrawlResult) -> StorageResult<()>;

    /// Returns the members of `urls` not yet recorded for this tenant
    ///
    /// If the lookup fails, all of `urls` is returned and a warning is
    /// logged. Crawling a page twice is preferred over silently losing it.
    async fn filter_existing(&self, urls: &HashSet<String>) -> HashSet<String> {
        if urls.is_empty() {
            return HashSet::new();
        }

        match self.existing_urls(urls).await {
            Ok(existing) => urls.difference(&existing).cloned().collect(),
            Err(e) => {
                tracing::warn!(
                    "Dedup lookup failed for tenant {}, treating all {} candidates as new: {}",
                    self.tenant(),
                    urls.len(),
                    e
                );
                urls.clone()
            }
        }
    }
}

/// Key layout of a listing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySchema {
    /// Hash key attribute (tenant name)
    pub partition_key: &'static str,

    /// Range key attribute (page URL)
    pub sort_key: &'static str,
}

/// The one key schema listing tables are created with
pub const LISTING_KEY_SCHEMA: KeySchema = KeySchema {
    partition_key: "name",
    sort_key: "url",
};

/// One row of a listing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableItem {
    pub partition: String,
    pub sort: String,

    /// Full record as JSON
    pub body: String,
}

/// A keyed-table engine
///
/// Models the small subset of a managed key-value table service the store
/// needs: describe, create, wait, put and query by partition.
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn table_exists(&self, table: &str) -> StorageResult<bool>;

    async fn create_table(&self, table: &str, schema: KeySchema) -> StorageResult<()>;

    /// Upserts an item; an existing item with the same keys is replaced
    async fn put_item(&self, table: &str, item: TableItem) -> StorageResult<()>;

    async fn get_item(
        &self,
        table: &str,
        partition: &str,
        sort: &str,
    ) -> StorageResult<Option<TableItem>>;

    /// Returns every sort key stored under `partition`
    async fn query_sort_keys(&self, table: &str, partition: &str)
        -> StorageResult<HashSet<String>>;

    /// Polls until the table is visible
    ///
    /// Engines that create tables synchronously return on the first poll.
    async fn wait_until_exists(&self, table: &str) -> StorageResult<()> {
        const ATTEMPTS: u32 = 25;
        const INTERVAL: Duration = Duration::from_millis(200);

        for _ in 0..ATTEMPTS {
            if self.table_exists(table).await? {
                return Ok(());
            }
            tokio::time::sleep(INTERVAL).await;
        }

        Err(StorageError::Setup(format!(
            "table {} did not become available",
            table
        )))
    }
}
