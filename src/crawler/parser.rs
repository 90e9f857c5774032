//! HTML parsing for link discovery and content rendering
//!
//! This module handles:
//! - Extracting followable links from `<a href>` tags
//! - Reading the page title
//! - Rendering the page (or selected elements) as markdown

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Links found on the page, absolute, in document order
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and the title
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">`, resolved against `base_url`; `rel="nofollow"`
/// links are followed.
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use listing_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Imóveis</title></head><body><a href="/imovel/1">Casa</a></body></html>"#;
/// let base_url = Url::parse("https://acme.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Imóveis".to_string()));
/// assert_eq!(parsed.links, vec!["https://acme.com/imovel/1".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}

/// Renders a page as markdown
///
/// With `target_elements` set, only elements matching those CSS selectors are
/// rendered, in selector order; if none match, the whole page is used.
pub fn html_to_markdown(html: &str, target_elements: &[String]) -> String {
    let document = Html::parse_document(html);
    let fragment = select_targets(&document, target_elements).unwrap_or_else(|| html.to_string());

    htmd::convert(&fragment).unwrap_or_else(|_| {
        // Fallback: plain text
        Html::parse_fragment(&fragment)
            .root_element()
            .text()
            .collect::<String>()
    })
}

fn select_targets(document: &Html, target_elements: &[String]) -> Option<String> {
    let mut parts = Vec::new();

    for selector_str in target_elements {
        match Selector::parse(selector_str) {
            Ok(selector) => parts.extend(document.select(&selector).map(|el| el.html())),
            Err(_) => tracing::debug!("Ignoring invalid target selector {}", selector_str),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
