//! Robots.txt handling module
//!
//! Optional politeness layer for the HTTP page source: each host's
//! robots.txt is fetched once per run and disallowed URLs are skipped.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use reqwest::Client;

/// Fetches robots.txt for an origin such as `https://acme.com`
///
/// Never fails: a missing file, an error status or a network failure all
/// yield rules that allow everything.
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let url = format!("{}/robots.txt", origin.trim_end_matches('/'));

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Could not fetch {}: {}", url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!("{} returned {}", url, response.status());
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::debug!("Could not read {}: {}", url, e);
            ParsedRobots::allow_all()
        }
    }
}
