//! Keyed-table persistence backend
//!
//! Records live in a table keyed by tenant (`name`, hash key) and page URL
//! (`url`, range key). The engine behind the table is a [`TableClient`].

use crate::storage::traits::{
    PersistenceStore, StorageError, StorageResult, TableClient, TableItem, LISTING_KEY_SCHEMA,
};
use crate::storage::CrawlResult;
use async_trait::async_trait;
use std::collections::HashSet;

/// Persistence store over a keyed table
pub struct TableStore<C> {
    client: C,
    table: String,
    tenant: String,
    hash_content: bool,
}

impl<C: TableClient> TableStore<C> {
    /// Binds a store to `table`, creating the table if it does not exist
    ///
    /// Returns only once the table is usable; any failure here is a setup
    /// failure and the run must not start.
    pub async fn open(
        client: C,
        table: &str,
        tenant: &str,
        hash_content: bool,
    ) -> StorageResult<Self> {
        validate_table_name(table)?;

        let exists = client
            .table_exists(table)
            .await
            .map_err(|e| StorageError::Setup(format!("could not describe table {}: {}", table, e)))?;

        if exists {
            tracing::debug!("Using existing table {}", table);
        } else {
            tracing::info!("Creating table {}", table);
            client
                .create_table(table, LISTING_KEY_SCHEMA)
                .await
                .map_err(|e| StorageError::Setup(format!("could not create table {}: {}", table, e)))?;
            client.wait_until_exists(table).await?;
        }

        Ok(Self {
            client,
            table: table.to_string(),
            tenant: tenant.to_string(),
            hash_content,
        })
    }

    /// Reads back the stored record for `url` in this store's tenant
    pub async fn get(&self, url: &str) -> StorageResult<Option<CrawlResult>> {
        match self.client.get_item(&self.table, &self.tenant, url).await? {
            Some(item) => Ok(Some(serde_json::from_str(&item.body)?)),
            None => Ok(None),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: TableClient> PersistenceStore for TableStore<C> {
    fn tenant(&self) -> &str {
        &self.tenant
    }

    async fn existing_urls(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>> {
        let stored = self
            .client
            .query_sort_keys(&self.table, &self.tenant)
            .await?;
        Ok(urls.intersection(&stored).cloned().collect())
    }

    async fn add_item(&self, result: &CrawlResult) -> StorageResult<()> {
        let body = if self.hash_content {
            serde_json::to_string(&result.with_hashed_content())?
        } else {
            serde_json::to_string(result)?
        };

        self.client
            .put_item(
                &self.table,
                TableItem {
                    partition: result.tenant.clone(),
                    sort: result.url.clone(),
                    body,
                },
            )
            .await?;

        tracing::debug!("Stored {} for {}", result.url, result.tenant);
        Ok(())
    }
}

/// Checks a table name against the naming rules of managed table services
///
/// 3 to 255 characters from `a-z`, `A-Z`, `0-9`, `_`, `-` and `.`.
pub fn validate_table_name(name: &str) -> StorageResult<()> {
    if name.len() < 3 || name.len() > 255 {
        return Err(StorageError::Setup(format!(
            "table name '{}' must be between 3 and 255 characters",
            name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(StorageError::Setup(format!(
            "table name '{}' may only contain letters, digits, '_', '-' and '.'",
            name
        )));
    }

    Ok(())
}
