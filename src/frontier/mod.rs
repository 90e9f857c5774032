//! Crawl frontier
//!
//! Work queues over discovered pages for a single run:
//! - [`Frontier`]: FIFO, a URL is held at most once while queued
//! - [`PriorityFrontier`]: best-first with the same dedup contract, used by
//!   link discovery
//!
//! Neither queue remembers dequeued URLs; visited tracking belongs to the
//! traversal and long-lived dedup to the persistence store.

mod priority;
mod queue;

pub use priority::{PriorityFrontier, QueuedPage};
pub use queue::Frontier;

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors raised by frontier operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    #[error("Frontier is empty")]
    EmptyQueue,
}

/// Role of a page within a listing site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Index or search-result page linking to listings
    Listing,
    /// A single listing's detail page
    Detail,
}

/// A discovered page
///
/// Equality and hashing consider the URL only, so re-discovering a page at a
/// different level is still the same page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub level: Level,
    pub visited: bool,
}

impl Page {
    pub fn new(url: impl Into<String>, level: Level) -> Self {
        Self {
            url: url.into(),
            level,
            visited: false,
        }
    }

    pub fn listing(url: impl Into<String>) -> Self {
        Self::new(url, Level::Listing)
    }

    pub fn detail(url: impl Into<String>) -> Self {
        Self::new(url, Level::Detail)
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Page {}

impl Hash for Page {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}
