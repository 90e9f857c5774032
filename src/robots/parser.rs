//! Robots.txt rules
//!
//! Matching is delegated to the robotstxt crate; this wrapper only keeps the
//! raw file and short-circuits hosts without rules.

use robotstxt::DefaultMatcher;

/// Rules of one host's robots.txt
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Rules that allow everything
    ///
    /// Used when a host has no robots.txt or it cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent product token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path (e.g., "/imovel/12")
    /// * `user_agent` - Product token, e.g. "listing-crawler"
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
