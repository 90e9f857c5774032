//! Orchestrator runs against both persistence backends

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use listing_crawler::config::{FetchConfig, TenantConfig};
use listing_crawler::crawler::{
    DiscoverOptions, DiscoveredPage, FetchOutcome, FetchedPage, Orchestrator, PageSource,
    RunReport,
};
use listing_crawler::extract::{ExtractError, ExtractResult, Extractor, Property};
use listing_crawler::storage::{
    CrawlResult, KeySchema, LocalFileStore, MemoryTableClient, PersistenceStore, StorageError,
    StorageResult, TableClient, TableItem, TableStore,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const URL_A: &str = "https://acme.com/imovel/a";
const URL_B: &str = "https://acme.com/imovel/b";

/// Start page linking to the two detail pages `/a` and `/b`
struct TwoListings;

#[async_trait]
impl PageSource for TwoListings {
    async fn discover(
        &self,
        start_url: &str,
        _options: &DiscoverOptions,
    ) -> listing_crawler::Result<Vec<DiscoveredPage>> {
        Ok(vec![DiscoveredPage {
            url: start_url.to_string(),
            internal_links: vec![
                "https://acme.com/contato".to_string(),
                URL_A.to_string(),
                URL_B.to_string(),
            ],
        }])
    }

    fn fetch_many(&self, urls: Vec<String>, _options: &FetchConfig) -> BoxStream<'_, FetchOutcome> {
        stream::iter(urls.into_iter().map(|url| {
            Ok(FetchedPage {
                markdown: format!("# Imóvel {}", url),
                url,
            })
        }))
        .boxed()
    }
}

/// Records every URL it is asked to extract and fails on the listed ones
#[derive(Default)]
struct RecordingExtractor {
    failing: Vec<String>,
    seen: Mutex<Vec<String>>,
}

impl RecordingExtractor {
    fn failing_on(url: &str) -> Self {
        Self {
            failing: vec![url.to_string()],
            ..Default::default()
        }
    }

    fn seen(&self) -> HashSet<String> {
        self.seen.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl Extractor for RecordingExtractor {
    async fn extract(&self, url: &str, _markdown: &str) -> ExtractResult<Option<Property>> {
        self.seen.lock().unwrap().push(url.to_string());
        if self.failing.iter().any(|failing| failing == url) {
            return Err(ExtractError::Api("HTTP 503".to_string()));
        }
        Ok(Some(Property {
            title: Some(format!("Listing {}", url)),
            ..Default::default()
        }))
    }
}

/// Table engine whose partition queries always fail
#[derive(Clone, Default)]
struct UnreadableTable {
    inner: MemoryTableClient,
}

#[async_trait]
impl TableClient for UnreadableTable {
    async fn table_exists(&self, table: &str) -> StorageResult<bool> {
        self.inner.table_exists(table).await
    }

    async fn create_table(&self, table: &str, schema: KeySchema) -> StorageResult<()> {
        self.inner.create_table(table, schema).await
    }

    async fn put_item(&self, table: &str, item: TableItem) -> StorageResult<()> {
        self.inner.put_item(table, item).await
    }

    async fn get_item(
        &self,
        table: &str,
        partition: &str,
        sort: &str,
    ) -> StorageResult<Option<TableItem>> {
        self.inner.get_item(table, partition, sort).await
    }

    async fn query_sort_keys(
        &self,
        _table: &str,
        _partition: &str,
    ) -> StorageResult<HashSet<String>> {
        Err(StorageError::Read("throttled".to_string()))
    }
}

/// Table engine refusing writes for one URL
#[derive(Clone, Default)]
struct RejectingTable {
    inner: MemoryTableClient,
    rejected: String,
}

#[async_trait]
impl TableClient for RejectingTable {
    async fn table_exists(&self, table: &str) -> StorageResult<bool> {
        self.inner.table_exists(table).await
    }

    async fn create_table(&self, table: &str, schema: KeySchema) -> StorageResult<()> {
        self.inner.create_table(table, schema).await
    }

    async fn put_item(&self, table: &str, item: TableItem) -> StorageResult<()> {
        if item.sort == self.rejected {
            return Err(StorageError::Write("provisioned throughput exceeded".to_string()));
        }
        self.inner.put_item(table, item).await
    }

    async fn get_item(
        &self,
        table: &str,
        partition: &str,
        sort: &str,
    ) -> StorageResult<Option<TableItem>> {
        self.inner.get_item(table, partition, sort).await
    }

    async fn query_sort_keys(
        &self,
        table: &str,
        partition: &str,
    ) -> StorageResult<HashSet<String>> {
        self.inner.query_sort_keys(table, partition).await
    }
}

#[derive(Clone, Copy, Debug)]
enum Backend {
    Table,
    File,
}

const BACKENDS: [Backend; 2] = [Backend::Table, Backend::File];

/// A store under test, a second tenant's store over the same data, and
/// whatever keeps that data alive
struct Harness {
    store: Arc<dyn PersistenceStore>,
    other_tenant: Arc<dyn PersistenceStore>,
    _dir: TempDir,
}

impl Harness {
    async fn open(backend: Backend) -> Self {
        let dir = TempDir::new().unwrap();
        let (store, other_tenant): (Arc<dyn PersistenceStore>, Arc<dyn PersistenceStore>) =
            match backend {
                Backend::Table => {
                    let client = MemoryTableClient::new();
                    (
                        Arc::new(
                            TableStore::open(client.clone(), "listings", "acme", false)
                                .await
                                .unwrap(),
                        ),
                        Arc::new(
                            TableStore::open(client, "listings", "other", false)
                                .await
                                .unwrap(),
                        ),
                    )
                }
                Backend::File => {
                    let file = dir.path().join("listings.jsonl");
                    (
                        Arc::new(LocalFileStore::new(&file, "acme", false)),
                        Arc::new(LocalFileStore::new(&file, "other", false)),
                    )
                }
            };
        Self {
            store,
            other_tenant,
            _dir: dir,
        }
    }

    async fn stored(&self) -> HashSet<String> {
        let all: HashSet<String> = [URL_A, URL_B].iter().map(|s| s.to_string()).collect();
        self.store.existing_urls(&all).await.unwrap()
    }
}

fn tenant() -> TenantConfig {
    TenantConfig {
        name: "acme".to_string(),
        start_page: Some("https://acme.com/".to_string()),
        page_template: None,
        max_synthetic_pages: None,
        items_url_pattern: "https://acme.com/imovel/".to_string(),
        max_depth: 2,
        max_pages: 50,
        allowed_domains: vec![],
        blocked_domains: vec![],
        filter_patterns: vec![],
        keywords: vec![],
        weight: 1.0,
        target_elements: vec![],
    }
}

async fn run(
    store: Arc<dyn PersistenceStore>,
    extractor: Arc<RecordingExtractor>,
) -> RunReport {
    let mut orchestrator = Orchestrator::new(
        tenant(),
        FetchConfig::default(),
        Arc::new(TwoListings),
        extractor,
        store,
    )
    .unwrap();
    orchestrator.run().await.unwrap()
}

fn urls(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Parses every well-formed line of a JSON-lines file
fn read_lines(path: &Path) -> Vec<CrawlResult> {
    let bytes = std::fs::read(path).unwrap();
    bytes
        .split(|b| *b == b'\n')
        .filter_map(|line| serde_json::from_slice(line).ok())
        .collect()
}

#[tokio::test]
async fn test_empty_store_persists_every_listing() {
    for backend in BACKENDS {
        let harness = Harness::open(backend).await;
        let extractor = Arc::new(RecordingExtractor::default());

        let report = run(harness.store.clone(), extractor.clone()).await;

        assert_eq!(report.discovered, 2, "{:?}", backend);
        assert_eq!(report.persisted, 2, "{:?}", backend);
        assert_eq!(extractor.seen(), urls(&[URL_A, URL_B]), "{:?}", backend);
        assert_eq!(harness.stored().await, urls(&[URL_A, URL_B]), "{:?}", backend);
    }
}

#[tokio::test]
async fn test_recorded_listing_is_not_extracted_again() {
    for backend in BACKENDS {
        let harness = Harness::open(backend).await;
        harness
            .store
            .add_item(&CrawlResult::new("acme", URL_A, "# antigo", None))
            .await
            .unwrap();
        let extractor = Arc::new(RecordingExtractor::default());

        let report = run(harness.store.clone(), extractor.clone()).await;

        assert_eq!(report.new, 1, "{:?}", backend);
        assert_eq!(report.persisted, 1, "{:?}", backend);
        assert_eq!(extractor.seen(), urls(&[URL_B]), "{:?}", backend);
    }
}

#[tokio::test]
async fn test_other_tenant_records_do_not_dedup() {
    for backend in BACKENDS {
        let harness = Harness::open(backend).await;
        harness
            .other_tenant
            .add_item(&CrawlResult::new("other", URL_A, "# outro", None))
            .await
            .unwrap();

        let report = run(harness.store.clone(), Arc::new(RecordingExtractor::default())).await;

        assert_eq!(report.new, 2, "{:?}", backend);
        assert_eq!(report.persisted, 2, "{:?}", backend);
    }
}

#[tokio::test]
async fn test_extraction_failure_skips_only_that_listing() {
    for backend in BACKENDS {
        let harness = Harness::open(backend).await;
        let extractor = Arc::new(RecordingExtractor::failing_on(URL_B));

        let report = run(harness.store.clone(), extractor).await;

        assert_eq!(report.persisted, 1, "{:?}", backend);
        assert_eq!(report.extraction_failures, 1, "{:?}", backend);
        assert_eq!(harness.stored().await, urls(&[URL_A]), "{:?}", backend);
    }
}

#[tokio::test]
async fn test_failed_dedup_read_lets_every_listing_through() {
    let client = UnreadableTable::default();
    let table = TableStore::open(client.clone(), "listings", "acme", false)
        .await
        .unwrap();
    let report = run(Arc::new(table), Arc::new(RecordingExtractor::default())).await;
    assert_eq!(report.new, 2);
    assert_eq!(report.persisted, 2);
    assert_eq!(client.inner.len("listings"), 2);

    // Invalid UTF-8 makes the file unreadable while appends still succeed
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("acme.jsonl");
    std::fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();
    let store = Arc::new(LocalFileStore::new(&path, "acme", false));
    let report = run(store, Arc::new(RecordingExtractor::default())).await;
    assert_eq!(report.new, 2);
    assert_eq!(report.persisted, 2);

    let written: HashSet<String> = read_lines(&path).into_iter().map(|r| r.url).collect();
    assert_eq!(written, urls(&[URL_A, URL_B]));
}

#[tokio::test]
async fn test_rerun_overwrites_nothing_new() {
    for backend in BACKENDS {
        let harness = Harness::open(backend).await;
        run(harness.store.clone(), Arc::new(RecordingExtractor::default())).await;

        let extractor = Arc::new(RecordingExtractor::default());
        let report = run(harness.store.clone(), extractor.clone()).await;

        assert_eq!(report.new, 0, "{:?}", backend);
        assert_eq!(report.persisted, 0, "{:?}", backend);
        assert!(extractor.seen().is_empty(), "{:?}", backend);
    }
}

#[tokio::test]
async fn test_write_failure_is_counted_and_run_continues() {
    let client = RejectingTable {
        rejected: URL_B.to_string(),
        ..Default::default()
    };
    let store = TableStore::open(client.clone(), "listings", "acme", false)
        .await
        .unwrap();
    let mut orchestrator = Orchestrator::new(
        tenant(),
        FetchConfig::default(),
        Arc::new(TwoListings),
        Arc::new(RecordingExtractor::default()),
        Arc::new(store),
    )
    .unwrap();

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.persisted, 1);
    assert_eq!(report.persist_failures, 1);
    assert_eq!(client.inner.len("listings"), 1);
}
