use super::UrlFilter;
use crate::url::{extract_domain, matches_wildcard};
use url::Url;

/// Allow/block list over URL hosts
///
/// A plain entry such as `acme.com` covers the domain and all of its
/// subdomains; `*.acme.com` is accepted as an explicit spelling of the same
/// thing. The block list is checked first and always wins.
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    allowed: Vec<String>,
    blocked: Vec<String>,
}

impl DomainFilter {
    pub fn new(allowed: &[String], blocked: &[String]) -> Self {
        Self {
            allowed: allowed.iter().map(|d| as_wildcard(d)).collect(),
            blocked: blocked.iter().map(|d| as_wildcard(d)).collect(),
        }
    }

    fn is_blocked(&self, domain: &str) -> bool {
        self.blocked.iter().any(|p| matches_wildcard(p, domain))
    }

    fn is_allowed(&self, domain: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|p| matches_wildcard(p, domain))
    }
}

impl UrlFilter for DomainFilter {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn accepts(&self, url: &Url, _content_type: Option<&str>) -> bool {
        match extract_domain(url) {
            Some(domain) => !self.is_blocked(&domain) && self.is_allowed(&domain),
            None => self.allowed.is_empty() && self.blocked.is_empty(),
        }
    }
}

fn as_wildcard(domain: &str) -> String {
    let domain = domain.trim().to_lowercase();
    if domain.starts_with("*.") {
        domain
    } else {
        format!("*.{}", domain)
    }
}
