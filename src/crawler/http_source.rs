//! Page source over plain HTTP
//!
//! Discovery is a best-first traversal: pages are visited highest keyword
//! score first, bounded by depth and page count. Detail pages are collected
//! as links but never expanded. Fetching converts each page to markdown.

use crate::config::FetchConfig;
use crate::crawler::fetcher::{build_http_client, fetch_url, politeness_delay, FetchResult};
use crate::crawler::parser::{html_to_markdown, parse_html};
use crate::crawler::source::{
    DiscoverOptions, DiscoveredPage, FetchFailure, FetchOutcome, FetchedPage, PageSource,
};
use crate::filter::ContentTypeFilter;
use crate::frontier::{Page, PriorityFrontier};
use crate::robots::RobotsCache;
use crate::url::{is_internal, normalize_url};
use crate::CrawlError;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use std::collections::HashSet;
use url::Url;

/// [`PageSource`] backed by reqwest, scraper and htmd
pub struct HttpPageSource {
    client: Client,
    robots: Option<RobotsCache>,
    target_elements: Vec<String>,
    html_only: ContentTypeFilter,
}

impl HttpPageSource {
    /// Creates a page source
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch configuration (user agent, timeout, robots.txt)
    /// * `target_elements` - CSS selectors narrowing the rendered content
    pub fn new(config: &FetchConfig, target_elements: &[String]) -> crate::Result<Self> {
        let client = build_http_client(config)?;
        let robots = config
            .respect_robots
            .then(|| RobotsCache::new(client.clone(), &config.user_agent));

        Ok(Self {
            client,
            robots,
            target_elements: target_elements.to_vec(),
            html_only: ContentTypeFilter::html(),
        })
    }

    async fn robots_allow(&self, url: &Url) -> bool {
        match &self.robots {
            Some(robots) => robots.is_allowed(url).await,
            None => true,
        }
    }

    /// Normalized same-site links of a page, first occurrence only
    fn internal_links(links: &[String], site: &Url) -> Vec<String> {
        let mut seen = HashSet::new();
        links
            .iter()
            .filter_map(|link| normalize_url(link).ok())
            .filter(|link| is_internal(link, site))
            .map(String::from)
            .filter(|link| seen.insert(link.clone()))
            .collect()
    }

    async fn fetch_one(&self, url: String, config: &FetchConfig) -> FetchOutcome {
        tokio::time::sleep(politeness_delay(config)).await;

        if let Ok(parsed) = Url::parse(&url) {
            if !self.robots_allow(&parsed).await {
                return Err(FetchFailure::new(url, "disallowed by robots.txt"));
            }
        }

        match fetch_url(&self.client, &url).await {
            FetchResult::Success {
                content_type, body, ..
            } => {
                if !content_type.is_empty() && !self.html_only.allows(&content_type) {
                    return Err(FetchFailure::new(
                        url,
                        format!("expected HTML, got {}", content_type),
                    ));
                }
                let markdown = html_to_markdown(&body, &self.target_elements);
                tracing::debug!("Fetched {} ({} chars)", url, markdown.len());
                Ok(FetchedPage { url, markdown })
            }
            other => {
                let message = other.failure_reason().unwrap_or_default();
                Err(FetchFailure::new(url, message))
            }
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn discover(
        &self,
        start_url: &str,
        options: &DiscoverOptions,
    ) -> crate::Result<Vec<DiscoveredPage>> {
        let start = normalize_url(start_url)?;
        let max_pages = options.max_pages as usize;

        let mut frontier = PriorityFrontier::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages = Vec::new();

        frontier.push(
            Page::listing(start.as_str()),
            0,
            options.scorer.score(start.as_str()),
        );

        while let Some(next) = frontier.pop() {
            if pages.len() >= max_pages {
                break;
            }

            let url_str = next.page.url;
            if !visited.insert(url_str.clone()) {
                continue;
            }
            let url = Url::parse(&url_str)?;

            if !self.robots_allow(&url).await {
                tracing::info!("URL {} disallowed by robots.txt", url_str);
                continue;
            }

            let (final_url, body) = match fetch_url(&self.client, &url_str).await {
                FetchResult::Success {
                    final_url,
                    content_type,
                    body,
                } => {
                    let known = (!content_type.is_empty()).then_some(content_type.as_str());
                    // The entry page is chosen by configuration, not by the link policy
                    let accepted = if next.depth == 0 {
                        known.map_or(true, |ct| self.html_only.allows(ct))
                    } else {
                        options.filter.accepts_url(&url, known)
                    };
                    if !accepted {
                        tracing::debug!("Skipping {} ({})", url_str, content_type);
                        continue;
                    }
                    (final_url, body)
                }
                other => {
                    let message = other.failure_reason().unwrap_or_default();
                    if next.depth == 0 {
                        return Err(CrawlError::Discovery {
                            url: url_str,
                            message,
                        });
                    }
                    tracing::debug!("Failed to fetch {}: {}", url_str, message);
                    continue;
                }
            };

            let base = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
            let parsed = parse_html(&body, &base);
            let links = Self::internal_links(&parsed.links, &start);
            tracing::debug!(
                "Visited {} at depth {}: {} internal links",
                url_str,
                next.depth,
                links.len()
            );

            if next.depth < options.max_depth {
                for link in &links {
                    if visited.contains(link) {
                        continue;
                    }
                    let is_detail = options
                        .detail_pattern
                        .as_ref()
                        .is_some_and(|pattern| pattern.is_match(link));
                    if is_detail || !options.filter.accepts(link, None) {
                        continue;
                    }
                    frontier.push(
                        Page::listing(link.as_str()),
                        next.depth + 1,
                        options.scorer.score(link),
                    );
                }
            }

            pages.push(DiscoveredPage {
                url: url_str,
                internal_links: links,
            });
        }

        tracing::info!("Discovery from {} visited {} pages", start, pages.len());
        Ok(pages)
    }

    fn fetch_many(&self, urls: Vec<String>, options: &FetchConfig) -> BoxStream<'_, FetchOutcome> {
        let config = options.clone();
        let concurrency = config.concurrency.max(1);

        stream::iter(urls)
            .map(move |url| {
                let config = config.clone();
                async move { self.fetch_one(url, &config).await }
            })
            .buffer_unordered(concurrency)
            .boxed()
    }
}
