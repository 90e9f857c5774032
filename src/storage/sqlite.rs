//! SQLite table engine
//!
//! Each listing table is a SQLite table with a composite primary key on the
//! partition and sort key columns; the full record is stored as JSON.

use crate::storage::traits::{KeySchema, StorageError, StorageResult, TableClient, TableItem};
use crate::storage::validate_table_name;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Table engine backed by a SQLite database file
pub struct SqliteTableClient {
    conn: Mutex<Connection>,
}

impl SqliteTableClient {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteTableClient)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Column names come from the key schema; table names are validated before
/// they reach SQL.
fn quoted(table: &str) -> StorageResult<String> {
    validate_table_name(table)?;
    Ok(format!("\"{}\"", table))
}

#[async_trait]
impl TableClient for SqliteTableClient {
    async fn table_exists(&self, table: &str) -> StorageResult<bool> {
        let count: i64 = self.lock().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn create_table(&self, table: &str, schema: KeySchema) -> StorageResult<()> {
        let sql = format!(
            "CREATE TABLE {table} (
                {pk} TEXT NOT NULL,
                {sk} TEXT NOT NULL,
                item TEXT NOT NULL,
                PRIMARY KEY ({pk}, {sk})
            )",
            table = quoted(table)?,
            pk = schema.partition_key,
            sk = schema.sort_key,
        );
        self.lock().execute_batch(&sql)?;
        Ok(())
    }

    async fn put_item(&self, table: &str, item: TableItem) -> StorageResult<()> {
        let sql = format!(
            "INSERT INTO {} (name, url, item) VALUES (?1, ?2, ?3)
             ON CONFLICT (name, url) DO UPDATE SET item = excluded.item",
            quoted(table)?
        );
        self.lock()
            .execute(&sql, params![item.partition, item.sort, item.body])
            .map_err(|e| StorageError::Write(format!("{} in {}: {}", item.sort, table, e)))?;
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        partition: &str,
        sort: &str,
    ) -> StorageResult<Option<TableItem>> {
        let sql = format!(
            "SELECT item FROM {} WHERE name = ?1 AND url = ?2",
            quoted(table)?
        );
        let body: Option<String> = self
            .lock()
            .query_row(&sql, params![partition, sort], |row| row.get(0))
            .optional()?;

        Ok(body.map(|body| TableItem {
            partition: partition.to_string(),
            sort: sort.to_string(),
            body,
        }))
    }

    async fn query_sort_keys(
        &self,
        table: &str,
        partition: &str,
    ) -> StorageResult<HashSet<String>> {
        let sql = format!("SELECT url FROM {} WHERE name = ?1", quoted(table)?);
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let keys = stmt
            .query_map(params![partition], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(keys)
    }
}
