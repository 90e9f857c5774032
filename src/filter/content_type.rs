use super::UrlFilter;
use url::Url;

/// Accepts responses whose media type is in an allow list
///
/// Only meaningful after a fetch; with no content type known the filter
/// accepts.
#[derive(Debug, Clone)]
pub struct ContentTypeFilter {
    allowed: Vec<String>,
}

impl ContentTypeFilter {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// HTML documents only
    pub fn html() -> Self {
        Self::new(&["text/html", "application/xhtml+xml"])
    }

    /// Checks a raw `Content-Type` header value
    pub fn allows(&self, content_type: &str) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        self.allowed.iter().any(|t| *t == essence)
    }
}

impl UrlFilter for ContentTypeFilter {
    fn name(&self) -> &'static str {
        "content-type"
    }

    fn accepts(&self, _url: &Url, content_type: Option<&str>) -> bool {
        content_type.map_or(true, |ct| self.allows(ct))
    }
}
