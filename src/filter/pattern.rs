use super::UrlFilter;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Accepts URLs matching at least one of a set of patterns
///
/// Two pattern forms are supported:
///
/// * **Glob** (default): `*` matches any run of characters and `?` a single
///   character; the glob must cover the whole URL, e.g. `*/imovel/*`.
/// * **Regex**: a pattern starting with `^` is used as a regular expression
///   and searched for in the URL.
///
/// With no patterns configured the filter accepts everything.
#[derive(Debug, Clone, Default)]
pub struct UrlPatternFilter {
    patterns: Vec<Regex>,
}

impl UrlPatternFilter {
    /// Compiles the given patterns
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` naming the first pattern that
    /// fails to compile.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(url))
    }
}

impl UrlFilter for UrlPatternFilter {
    fn name(&self) -> &'static str {
        "url-pattern"
    }

    fn accepts(&self, url: &Url, _content_type: Option<&str>) -> bool {
        self.matches(url.as_str())
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let source = if pattern.starts_with('^') {
        pattern.to_string()
    } else {
        glob_to_regex(pattern)
    };

    Regex::new(&source).map_err(|e| {
        ConfigError::InvalidPattern(format!("Invalid URL pattern '{}': {}", pattern, e))
    })
}

fn glob_to_regex(glob: &str) -> String {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push('^');
    for c in glob.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    source
}

/// Regex deciding which discovered links are listing detail pages
///
/// The match is anchored at the start of the URL but not at the end, so
/// `https://acme.com/imovel/` accepts every URL under that prefix.
#[derive(Debug, Clone)]
pub struct DetailPattern {
    regex: Regex,
}

impl DetailPattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid items-url-pattern '{}': {}", pattern, e))
        })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}
