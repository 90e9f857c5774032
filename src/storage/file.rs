//! Append-only JSON-lines persistence backend
//!
//! Every `add_item` appends one record per line. Overwrites are appends too;
//! readers resolve duplicate keys to the last line written. Only one process
//! may write a file at a time.

use crate::storage::traits::{PersistenceStore, StorageError, StorageResult};
use crate::storage::CrawlResult;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Persistence store writing JSON lines to a local file
pub struct LocalFileStore {
    path: PathBuf,
    tenant: String,
    hash_content: bool,
    write_lock: Mutex<()>,
}

impl LocalFileStore {
    pub fn new(path: impl AsRef<Path>, tenant: &str, hash_content: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        tracing::info!("Saving results to {}", path.display());
        Self {
            path,
            tenant: tenant.to_string(),
            hash_content,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored records of this store's tenant, one per key
    ///
    /// When a key was written more than once the last line wins; records are
    /// returned in order of first appearance.
    pub async fn records(&self) -> StorageResult<Vec<CrawlResult>> {
        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, CrawlResult> = HashMap::new();

        for record in self.read_records().await? {
            if !latest.contains_key(&record.url) {
                order.push(record.url.clone());
            }
            latest.insert(record.url.clone(), record);
        }

        Ok(order
            .into_iter()
            .filter_map(|url| latest.remove(&url))
            .collect())
    }

    /// Parses every line belonging to this tenant
    ///
    /// A missing file holds no records. Lines that do not parse are skipped
    /// with a warning so a torn final write does not block dedup.
    async fn read_records(&self) -> StorageResult<Vec<CrawlResult>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Read(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CrawlResult>(line) {
                Ok(record) if record.tenant == self.tenant => records.push(record),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    "Skipping malformed line {} in {}: {}",
                    index + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PersistenceStore for LocalFileStore {
    fn tenant(&self) -> &str {
        &self.tenant
    }

    async fn existing_urls(&self, urls: &HashSet<String>) -> StorageResult<HashSet<String>> {
        Ok(self
            .read_records()
            .await?
            .into_iter()
            .map(|record| record.url)
            .filter(|url| urls.contains(url))
            .collect())
    }

    async fn add_item(&self, result: &CrawlResult) -> StorageResult<()> {
        let mut line = if self.hash_content {
            serde_json::to_string(&result.with_hashed_content())?
        } else {
            serde_json::to_string(result)?
        };
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {}", self.path.display(), e)))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Appended {} to {}", result.url, self.path.display());
        Ok(())
    }
}
