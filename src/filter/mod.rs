//! URL acceptance and ranking policy
//!
//! A [`FilterChain`] decides whether a link may be followed (or fetched); a
//! [`KeywordRelevanceScorer`] decides in which order accepted links are
//! visited. Filters never rank and the scorer never excludes.

mod content_type;
mod domain;
mod pattern;
mod scorer;

pub use content_type::ContentTypeFilter;
pub use domain::DomainFilter;
pub use pattern::{DetailPattern, UrlPatternFilter};
pub use scorer::{score, KeywordRelevanceScorer};

use crate::config::TenantConfig;
use crate::ConfigError;
use url::Url;

/// A single URL acceptance predicate
///
/// Implementations must be deterministic: the same URL and content type
/// always produce the same decision. A predicate with nothing configured
/// accepts everything.
pub trait UrlFilter: Send + Sync {
    /// Short name used in trace output
    fn name(&self) -> &'static str;

    /// Returns true if `url` passes this predicate
    ///
    /// `content_type` is only known after a fetch; predicates that depend on
    /// it accept when it is `None`.
    fn accepts(&self, url: &Url, content_type: Option<&str>) -> bool;
}

/// Logical AND over a list of [`UrlFilter`]s
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn UrlFilter>>,
}

impl FilterChain {
    /// Creates an empty chain, which accepts every URL
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a predicate to the chain
    pub fn with(mut self, filter: impl UrlFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Builds the chain described by a tenant configuration
    ///
    /// The chain holds, in order: the URL-pattern filter, the domain filter
    /// and an HTML-only content-type filter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if a filter pattern does not compile.
    pub fn from_tenant(config: &TenantConfig) -> Result<Self, ConfigError> {
        Ok(Self::new()
            .with(UrlPatternFilter::new(&config.filter_patterns)?)
            .with(DomainFilter::new(
                &config.allowed_domains,
                &config.blocked_domains,
            ))
            .with(ContentTypeFilter::html()))
    }

    /// Returns true if `url` satisfies every predicate in the chain
    ///
    /// Unparseable URLs are rejected.
    pub fn accepts(&self, url: &str, content_type: Option<&str>) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.accepts_url(&parsed, content_type),
            Err(_) => false,
        }
    }

    /// Same as [`FilterChain::accepts`] for an already parsed URL
    pub fn accepts_url(&self, url: &Url, content_type: Option<&str>) -> bool {
        self.filters.iter().all(|filter| {
            let accepted = filter.accepts(url, content_type);
            if !accepted {
                tracing::trace!("{} rejected by {}", url, filter.name());
            }
            accepted
        })
    }

    /// Number of predicates in the chain
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
