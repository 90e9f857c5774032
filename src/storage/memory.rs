use crate::storage::traits::{KeySchema, StorageError, StorageResult, TableClient, TableItem};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

struct MemoryTable {
    schema: KeySchema,
    items: BTreeMap<(String, String), String>,
}

/// In-process table engine
///
/// Clones share the same tables, so a test can hand one clone to a store and
/// inspect another.
#[derive(Clone, Default)]
pub struct MemoryTableClient {
    tables: Arc<Mutex<HashMap<String, MemoryTable>>>,
}

impl MemoryTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key schema the table was created with, if it exists
    pub fn key_schema(&self, table: &str) -> Option<KeySchema> {
        self.lock().get(table).map(|t| t.schema)
    }

    /// Number of items in the table (0 if it does not exist)
    pub fn len(&self, table: &str) -> usize {
        self.lock().get(table).map_or(0, |t| t.items.len())
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MemoryTable>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn missing(table: &str) -> StorageError {
    StorageError::Read(format!("table {} does not exist", table))
}

#[async_trait]
impl TableClient for MemoryTableClient {
    async fn table_exists(&self, table: &str) -> StorageResult<bool> {
        Ok(self.lock().contains_key(table))
    }

    async fn create_table(&self, table: &str, schema: KeySchema) -> StorageResult<()> {
        let mut tables = self.lock();
        if tables.contains_key(table) {
            return Err(StorageError::Setup(format!("table {} already exists", table)));
        }
        tables.insert(
            table.to_string(),
            MemoryTable {
                schema,
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn put_item(&self, table: &str, item: TableItem) -> StorageResult<()> {
        let mut tables = self.lock();
        let target = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::Write(format!("table {} does not exist", table)))?;
        target.items.insert((item.partition, item.sort), item.body);
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        partition: &str,
        sort: &str,
    ) -> StorageResult<Option<TableItem>> {
        let tables = self.lock();
        let target = tables.get(table).ok_or_else(|| missing(table))?;
        Ok(target
            .items
            .get(&(partition.to_string(), sort.to_string()))
            .map(|body| TableItem {
                partition: partition.to_string(),
                sort: sort.to_string(),
                body: body.clone(),
            }))
    }

    async fn query_sort_keys(
        &self,
        table: &str,
        partition: &str,
    ) -> StorageResult<HashSet<String>> {
        let tables = self.lock();
        let target = tables.get(table).ok_or_else(|| missing(table))?;
        Ok(target
            .items
            .keys()
            .filter(|(p, _)| p == partition)
            .map(|(_, s)| s.clone())
            .collect())
    }
}
