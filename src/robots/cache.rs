//! Per-host robots.txt cache for one run

use crate::robots::{fetch_robots, ParsedRobots};
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Fetches each host's robots.txt at most once
pub struct RobotsCache {
    client: Client,
    product_token: String,
    hosts: Mutex<HashMap<String, ParsedRobots>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// Rules are matched against the product token of `user_agent`, the part
    /// before the first `/`.
    pub fn new(client: Client, user_agent: &str) -> Self {
        let product_token = user_agent
            .split('/')
            .next()
            .unwrap_or(user_agent)
            .trim()
            .to_string();

        Self {
            client,
            product_token,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if robots.txt of the URL's host permits fetching it
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        let origin = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        // Held across the fetch so concurrent callers wait for one request
        let mut hosts = self.hosts.lock().await;
        if !hosts.contains_key(&origin) {
            let robots = fetch_robots(&self.client, &origin).await;
            hosts.insert(origin.clone(), robots);
        }

        hosts
            .get(&origin)
            .map_or(true, |robots| robots.is_allowed(url.as_str(), &self.product_token))
    }

    pub fn product_token(&self) -> &str {
        &self.product_token
    }
}
