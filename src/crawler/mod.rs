//! Crawler module for listing discovery and harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with politeness delays
//! - HTML parsing, link extraction and markdown conversion
//! - Best-first discovery behind the [`PageSource`] boundary
//! - Run orchestration (discover, dedup, extract, persist)

mod fetcher;
mod http_source;
mod orchestrator;
mod parser;
mod source;

pub use fetcher::{build_http_client, fetch_url, politeness_delay, FetchResult};
pub use http_source::HttpPageSource;
pub use orchestrator::{Orchestrator, RunReport, RunState};
pub use parser::{html_to_markdown, parse_html, ParsedPage};
pub use source::{
    DiscoverOptions, DiscoveredPage, FetchFailure, FetchOutcome, FetchedPage, PageSource,
};

use crate::config::Config;
use crate::extract::{Extractor, NoopExtractor, OpenAiExtractor};
use crate::storage::open_store;
use std::sync::Arc;

/// Runs one complete crawl for the configured tenant
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the configured persistence backend
/// 2. Build the HTTP page source
/// 3. Build the extractor (a no-op one when no `[llm]` table is configured)
/// 4. Run the orchestrator and return its report
///
/// # Errors
///
/// Only setup failures are returned; per-URL failures are counted in the
/// report.
pub async fn crawl(config: &Config) -> crate::Result<RunReport> {
    let store = open_store(&config.storage, &config.tenant.name).await?;
    let source = HttpPageSource::new(&config.fetch, &config.tenant.target_elements)?;

    let extractor: Arc<dyn Extractor> = match &config.llm {
        Some(llm) => {
            let extractor = OpenAiExtractor::new(llm)?;
            tracing::info!("Extracting with model {}", extractor.model());
            Arc::new(extractor)
        }
        None => {
            tracing::info!("No extraction model configured, storing page content only");
            Arc::new(NoopExtractor)
        }
    };

    let mut orchestrator = Orchestrator::new(
        config.tenant.clone(),
        config.fetch.clone(),
        Arc::new(source),
        extractor,
        store,
    )?;

    orchestrator.run().await
}
