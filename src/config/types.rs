use serde::{Deserialize, Serialize};

/// Main configuration structure for one tenant run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub tenant: TenantConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TenantConfig {
    /// Tenant name, used as the dedup namespace (partition key)
    pub name: String,

    /// Entry page for best-first discovery
    #[serde(default)]
    pub start_page: Option<String>,

    /// Listing page URL template with a `{page}` placeholder
    #[serde(default)]
    pub page_template: Option<String>,

    /// Number of listing pages rendered from `page_template`
    #[serde(default)]
    pub max_synthetic_pages: Option<u32>,

    /// Regular expression matched (from the start) against detail page URLs
    pub items_url_pattern: String,

    /// Maximum traversal depth from the start page
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of pages fetched during discovery
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Domains the traversal may visit (empty allows all)
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Domains the traversal must never visit
    #[serde(default)]
    pub blocked_domains: Vec<String>,

    /// URL patterns a followed link must match (empty allows all)
    #[serde(default)]
    pub filter_patterns: Vec<String>,

    /// Keywords used to rank links during best-first discovery
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Multiplier applied to the keyword relevance score
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// CSS selectors narrowing the content handed to the extractor
    #[serde(default)]
    pub target_elements: Vec<String>,
}

/// Fetch stage behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Maximum number of pages fetched and extracted at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Base delay before each request (milliseconds)
    #[serde(default = "default_mean_delay_ms")]
    pub mean_delay_ms: u64,

    /// Upper bound of the random jitter added to the delay (milliseconds)
    #[serde(default = "default_max_range_ms")]
    pub max_range_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Skip URLs disallowed by the host's robots.txt
    #[serde(default)]
    pub respect_robots: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            mean_delay_ms: default_mean_delay_ms(),
            max_range_ms: default_max_range_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            respect_robots: false,
        }
    }
}

/// Which persistence backend a run writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Keyed table (partition key `name`, sort key `url`)
    Table,
    /// Local newline-delimited JSON file
    File,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub backend: BackendKind,

    /// Destination table for the table backend
    #[serde(default)]
    pub table_name: Option<String>,

    /// SQLite file hosting the table backend
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Destination file for the file backend
    #[serde(default)]
    pub output_file: Option<String>,

    /// Store a SHA-256 digest instead of the raw page content (table backend)
    #[serde(default)]
    pub hash_content: bool,
}

/// Extraction model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LlmConfig {
    /// Model identifier, optionally prefixed by a provider (`openai/gpt-4o-mini`)
    pub provider: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API token; `LLM_API_TOKEN` in the environment takes precedence
    #[serde(default)]
    pub api_token: Option<String>,

    /// Extraction instruction sent with every page
    pub prompt: String,

    /// Per-request timeout for extraction calls (seconds)
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Model name without the provider prefix
    pub fn model(&self) -> &str {
        self.provider
            .split_once('/')
            .map(|(_, model)| model)
            .unwrap_or(&self.provider)
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> u32 {
    500
}

fn default_weight() -> f64 {
    1.0
}

fn default_concurrency() -> usize {
    5
}

fn default_mean_delay_ms() -> u64 {
    500
}

fn default_max_range_ms() -> u64 {
    800
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("listing-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_database_path() -> String {
    "./listings.db".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_strips_provider_prefix() {
        let llm = LlmConfig {
            provider: "openai/gpt-4o-mini".to_string(),
            base_url: default_llm_base_url(),
            api_token: None,
            prompt: "extract".to_string(),
            timeout_secs: default_llm_timeout_secs(),
        };
        assert_eq!(llm.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_model_without_prefix() {
        let llm = LlmConfig {
            provider: "gpt-4o".to_string(),
            base_url: default_llm_base_url(),
            api_token: None,
            prompt: "extract".to_string(),
            timeout_secs: default_llm_timeout_secs(),
        };
        assert_eq!(llm.model(), "gpt-4o");
    }
}
