//! Page source boundary
//!
//! The orchestrator never talks HTTP itself: link discovery and page
//! fetching go through a [`PageSource`].

use crate::config::{FetchConfig, TenantConfig};
use crate::filter::{DetailPattern, FilterChain, KeywordRelevanceScorer};
use crate::ConfigError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Limits and policy for one discovery pass
#[derive(Clone)]
pub struct DiscoverOptions {
    /// Link distance from the start page beyond which links are not followed
    pub max_depth: u32,

    /// Maximum number of pages fetched
    pub max_pages: u32,

    /// Acceptance policy for followed links
    pub filter: Arc<FilterChain>,

    /// Visiting order of followed links
    pub scorer: KeywordRelevanceScorer,

    /// Links matching this pattern are detail pages and are not expanded
    pub detail_pattern: Option<DetailPattern>,
}

impl DiscoverOptions {
    /// Builds the options described by a tenant configuration
    pub fn from_tenant(config: &TenantConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            filter: Arc::new(FilterChain::from_tenant(config)?),
            scorer: KeywordRelevanceScorer::new(&config.keywords, config.weight),
            detail_pattern: Some(DetailPattern::new(&config.items_url_pattern)?),
        })
    }

    /// Same policy, limited to the start page itself
    pub fn single_page(&self) -> Self {
        Self {
            max_depth: 0,
            max_pages: 1,
            ..self.clone()
        }
    }
}

/// A page visited during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPage {
    pub url: String,

    /// Same-site links found on the page, normalized, in document order
    pub internal_links: Vec<String>,
}

/// A fetched detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub markdown: String,
}

/// A detail page that could not be fetched
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{url}: {message}")]
pub struct FetchFailure {
    pub url: String,
    pub message: String,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Result of fetching one page
pub type FetchOutcome = Result<FetchedPage, FetchFailure>;

/// Where pages come from
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Traverses a site from `start_url` and reports every visited page
    ///
    /// # Errors
    ///
    /// Fails if the start page itself cannot be fetched; failures deeper in
    /// the traversal only shorten the result.
    async fn discover(
        &self,
        start_url: &str,
        options: &DiscoverOptions,
    ) -> crate::Result<Vec<DiscoveredPage>>;

    /// Fetches `urls` concurrently, yielding outcomes in completion order
    ///
    /// The stream is finite (one item per URL) and cannot be restarted.
    fn fetch_many(&self, urls: Vec<String>, options: &FetchConfig) -> BoxStream<'_, FetchOutcome>;
}
