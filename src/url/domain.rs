use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use listing_crawler::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Acme.com.br/imoveis").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.acme.com.br".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches a pattern
///
/// `example.com` matches only itself; `*.example.com` matches the bare
/// domain and every subdomain below it. Both sides are expected lowercase.
///
/// ```
/// use listing_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.acme.com", "acme.com"));
/// assert!(matches_wildcard("*.acme.com", "www.acme.com"));
/// assert!(!matches_wildcard("acme.com", "www.acme.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Returns true when `link` points at the same site as `base`
///
/// Hosts are compared without a leading `www.` so that
/// `acme.com` and `www.acme.com` count as one site.
pub fn is_internal(link: &Url, base: &Url) -> bool {
    match (extract_domain(link), extract_domain(base)) {
        (Some(a), Some(b)) => strip_www(&a) == strip_www(&b),
        _ => false,
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
