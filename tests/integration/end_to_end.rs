//! Whole crawls against mock listing sites

use listing_crawler::config::{
    BackendKind, Config, FetchConfig, LlmConfig, StorageConfig, TenantConfig,
};
use listing_crawler::crawler::crawl;
use listing_crawler::storage::{LocalFileStore, SqliteTableClient, TableStore};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// Home page linking to two listings and an about page
async fn listing_site() -> MockServer {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><body>
            <a href="/imovel/1">Apartamento 2 quartos</a>
            <a href="/imovel/2?utm_source=home">Casa com piscina</a>
            <a href="/sobre">Sobre</a>
            <a href="https://portal.example.org/imovel/9">Parceiro</a>
        </body></html>"#,
    )
    .await;
    mount_html(&server, "/sobre", r#"<a href="/imovel/2">Destaque</a>"#).await;
    mount_html(
        &server,
        "/imovel/1",
        "<html><body><main><h1>Apartamento</h1><p>2 quartos</p></main></body></html>",
    )
    .await;
    mount_html(
        &server,
        "/imovel/2",
        "<html><body><main><h1>Casa</h1><p>Piscina</p></main></body></html>",
    )
    .await;
    server
}

fn config(server: &MockServer, storage: StorageConfig) -> Config {
    let base = server.uri();
    Config {
        tenant: TenantConfig {
            name: "acme".to_string(),
            start_page: Some(format!("{}/", base)),
            page_template: None,
            max_synthetic_pages: None,
            items_url_pattern: format!("{}/imovel/", base),
            max_depth: 2,
            max_pages: 20,
            allowed_domains: vec![],
            blocked_domains: vec![],
            filter_patterns: vec![],
            keywords: vec!["imovel".to_string()],
            weight: 1.0,
            target_elements: vec!["main".to_string()],
        },
        fetch: FetchConfig {
            mean_delay_ms: 0,
            max_range_ms: 0,
            timeout_secs: 5,
            ..FetchConfig::default()
        },
        storage,
        llm: None,
    }
}

fn file_storage(path: &Path) -> StorageConfig {
    StorageConfig {
        backend: BackendKind::File,
        table_name: None,
        database_path: String::new(),
        output_file: Some(path.display().to_string()),
        hash_content: false,
    }
}

#[tokio::test]
async fn test_file_backend_crawl_is_incremental() {
    let server = listing_site().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("acme.jsonl");
    let config = config(&server, file_storage(&output));

    let first = crawl(&config).await.unwrap();
    assert_eq!(first.discovered, 2);
    assert_eq!(first.new, 2);
    assert_eq!(first.persisted, 2);

    let records = LocalFileStore::new(&output, "acme", false)
        .records()
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    let first_record = records
        .iter()
        .find(|r| r.url.ends_with("/imovel/1"))
        .unwrap();
    assert!(first_record.raw_content.contains("Apartamento"));
    assert!(first_record.extracted.is_none());
    // Tracking parameters never reach the stored key
    assert!(records.iter().all(|r| !r.url.contains("utm_source")));

    let second = crawl(&config).await.unwrap();
    assert_eq!(second.discovered, 2);
    assert_eq!(second.new, 0);
    assert_eq!(second.persisted, 0);
}

#[tokio::test]
async fn test_table_backend_stores_extracted_property() {
    let server = listing_site().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": r#"{"reference": "AP-1", "operation": "SALE", "bedrooms": 2}"#
                }
            }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let database = dir.path().join("listings.db");
    let mut config = config(
        &server,
        StorageConfig {
            backend: BackendKind::Table,
            table_name: Some("listings".to_string()),
            database_path: database.display().to_string(),
            output_file: None,
            hash_content: true,
        },
    );
    config.llm = Some(LlmConfig {
        provider: "openai/gpt-4o-mini".to_string(),
        base_url: format!("{}/v1", server.uri()),
        api_token: Some("sk-test".to_string()),
        prompt: "Extract the listing.".to_string(),
        timeout_secs: 5,
    });

    let report = crawl(&config).await.unwrap();
    assert_eq!(report.persisted, 2);
    assert_eq!(report.extraction_failures, 0);

    let store = TableStore::open(
        SqliteTableClient::open(&database).unwrap(),
        "listings",
        "acme",
        true,
    )
    .await
    .unwrap();
    let stored = store
        .get(&format!("{}/imovel/1", server.uri()))
        .await
        .unwrap()
        .unwrap();
    let property = stored.extracted.unwrap();
    assert_eq!(property.reference.as_deref(), Some("AP-1"));
    assert_eq!(property.bedrooms, Some(2));
    // Hashing mode stores a hex SHA-256 digest instead of the markdown
    assert_eq!(stored.raw_content.len(), 64);
}

#[tokio::test]
async fn test_unreachable_start_page_finds_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("acme.jsonl");
    let report = crawl(&config(&server, file_storage(&output))).await.unwrap();

    assert_eq!(report.discovered, 0);
    assert_eq!(report.persisted, 0);
    assert!(!output.exists());
}
