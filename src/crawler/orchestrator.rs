//! Crawl orchestration for one tenant
//!
//! A run moves through four stages, each finished before the next starts:
//! - Discovering: collect candidate detail-page URLs
//! - Deduping: drop candidates already recorded for the tenant
//! - Extracting: fetch and extract the rest concurrently, persisting each
//!   result as it completes
//! - Done: report counters
//!
//! Per-URL failures are logged and counted; only setup can fail a run.

use crate::config::{FetchConfig, TenantConfig, PAGE_PLACEHOLDER};
use crate::crawler::source::{DiscoverOptions, DiscoveredPage, PageSource};
use crate::extract::Extractor;
use crate::filter::DetailPattern;
use crate::frontier::{Frontier, Page};
use crate::storage::{CrawlResult, PersistenceStore};
use crate::url::normalize_url;
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Deduping,
    Extracting,
    Done,
}

/// Counters of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Distinct detail-page candidates found
    pub discovered: usize,
    /// Candidates not yet recorded for the tenant
    pub new: usize,
    /// Pages fetched successfully
    pub fetched: usize,
    /// Results written to the store
    pub persisted: usize,
    pub fetch_failures: usize,
    pub extraction_failures: usize,
    pub persist_failures: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} new, {} fetched, {} persisted ({} fetch failures, {} extraction failures, {} write failures)",
            self.discovered,
            self.new,
            self.fetched,
            self.persisted,
            self.fetch_failures,
            self.extraction_failures,
            self.persist_failures
        )
    }
}

/// Runs discovery, dedup, extraction and persistence for one tenant
pub struct Orchestrator {
    tenant: TenantConfig,
    fetch: FetchConfig,
    source: Arc<dyn PageSource>,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn PersistenceStore>,
    options: DiscoverOptions,
    detail_pattern: DetailPattern,
    state: RunState,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if the detail-page pattern or a
    /// filter pattern does not compile.
    pub fn new(
        tenant: TenantConfig,
        fetch: FetchConfig,
        source: Arc<dyn PageSource>,
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn PersistenceStore>,
    ) -> crate::Result<Self> {
        let options = DiscoverOptions::from_tenant(&tenant)?;
        let detail_pattern = DetailPattern::new(&tenant.items_url_pattern)?;

        Ok(Self {
            tenant,
            fetch,
            source,
            extractor,
            store,
            options,
            detail_pattern,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs the whole pipeline once
    ///
    /// Always completes with a report; individual URLs that fail to fetch,
    /// extract or persist are logged, counted and skipped.
    pub async fn run(&mut self) -> crate::Result<RunReport> {
        let mut report = RunReport::default();
        tracing::info!("Starting run for tenant {}", self.tenant.name);

        self.state = RunState::Discovering;
        let candidates = self.discover().await;
        report.discovered = candidates.len();
        tracing::info!("Discovered {} candidate listings", candidates.len());

        self.state = RunState::Deduping;
        let candidate_set: HashSet<String> = candidates.iter().cloned().collect();
        let fresh = self.store.filter_existing(&candidate_set).await;
        let new_urls: Vec<String> = candidates
            .into_iter()
            .filter(|url| fresh.contains(url))
            .collect();
        report.new = new_urls.len();
        tracing::info!(
            "{} new listings, {} already recorded",
            report.new,
            report.discovered - report.new
        );

        self.state = RunState::Extracting;
        if !new_urls.is_empty() {
            self.extract_and_persist(new_urls, &mut report).await;
        }

        self.state = RunState::Done;
        tracing::info!(
            "Finished tenant {}: {} items persisted",
            self.tenant.name,
            report.persisted
        );
        tracing::debug!("Run report: {}", report);

        Ok(report)
    }

    /// Builds the candidate set: detail-page URLs in discovery order
    pub async fn discover(&self) -> Vec<String> {
        let candidates = Frontier::new();

        match (&self.tenant.start_page, &self.tenant.page_template) {
            (Some(start), _) => match self.source.discover(start, &self.options).await {
                Ok(pages) => self.harvest(&pages, &candidates),
                Err(e) => tracing::warn!("Discovery from {} failed: {}", start, e),
            },
            (None, Some(template)) => {
                let single = self.options.single_page();
                let page_count = self.tenant.max_synthetic_pages.unwrap_or(1);
                for page in 1..=page_count {
                    let url = template.replace(PAGE_PLACEHOLDER, &page.to_string());
                    match self.source.discover(&url, &single).await {
                        Ok(pages) => self.harvest(&pages, &candidates),
                        Err(e) => tracing::warn!("Listing page {} failed: {}", url, e),
                    }
                }
            }
            (None, None) => tracing::warn!("Tenant {} has no entry point", self.tenant.name),
        }

        let mut urls = Vec::with_capacity(candidates.size());
        while let Ok(page) = candidates.get() {
            urls.push(page.url);
        }
        urls
    }

    /// Queues the detail-page links of `pages`; the frontier drops repeats
    fn harvest(&self, pages: &[DiscoveredPage], candidates: &Frontier) {
        for link in pages.iter().flat_map(|page| &page.internal_links) {
            if !self.detail_pattern.is_match(link) || !self.options.filter.accepts(link, None) {
                continue;
            }
            match normalize_url(link) {
                Ok(url) => {
                    candidates.put(Page::detail(url));
                }
                Err(e) => tracing::debug!("Dropping candidate {}: {}", link, e),
            }
        }
    }

    async fn extract_and_persist(&self, urls: Vec<String>, report: &mut RunReport) {
        let concurrency = self.fetch.concurrency.max(1);
        let extractor = Arc::clone(&self.extractor);

        let mut completions = self
            .source
            .fetch_many(urls, &self.fetch)
            .map(|outcome| {
                let extractor = Arc::clone(&extractor);
                async move {
                    match outcome {
                        Ok(page) => {
                            let extracted = extractor.extract(&page.url, &page.markdown).await;
                            Ok((page, extracted))
                        }
                        Err(failure) => Err(failure),
                    }
                }
            })
            .buffer_unordered(concurrency);

        while let Some(completion) = completions.next().await {
            let (page, extracted) = match completion {
                Ok(done) => done,
                Err(failure) => {
                    report.fetch_failures += 1;
                    tracing::warn!("Failed to fetch {}: {}", failure.url, failure.message);
                    continue;
                }
            };
            report.fetched += 1;

            let property = match extracted {
                Ok(property) => property,
                Err(e) => {
                    report.extraction_failures += 1;
                    tracing::warn!("Extraction failed for {}: {}", page.url, e);
                    continue;
                }
            };

            let result = CrawlResult::new(&self.tenant.name, page.url, page.markdown, property);
            match self.store.add_item(&result).await {
                Ok(()) => {
                    report.persisted += 1;
                    tracing::debug!("Persisted {}", result.url);
                }
                Err(e) => {
                    report.persist_failures += 1;
                    tracing::warn!("Failed to persist {}: {}", result.url, e);
                }
            }
        }
    }
}
