use crate::config::types::{BackendKind, Config, FetchConfig, LlmConfig, StorageConfig, TenantConfig};
use crate::filter::{DetailPattern, UrlPatternFilter};
use crate::storage::validate_table_name;
use crate::ConfigError;
use url::Url;

/// Placeholder replaced by the page number in `page-template`
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_tenant_config(&config.tenant)?;
    validate_fetch_config(&config.fetch)?;
    validate_storage_config(&config.storage)?;
    if let Some(llm) = &config.llm {
        validate_llm_config(llm)?;
    }
    Ok(())
}

/// Validates the tenant (listing source) configuration
fn validate_tenant_config(config: &TenantConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "tenant name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "tenant name must contain only alphanumeric characters, '-' and '_', got '{}'",
            config.name
        )));
    }

    match (&config.start_page, &config.page_template) {
        (Some(start), None) => {
            validate_http_url(start, "start-page")?;
        }
        (None, Some(template)) => {
            if !template.contains(PAGE_PLACEHOLDER) {
                return Err(ConfigError::Validation(format!(
                    "page-template '{}' must contain the {} placeholder",
                    template, PAGE_PLACEHOLDER
                )));
            }
            validate_http_url(&template.replace(PAGE_PLACEHOLDER, "1"), "page-template")?;

            match config.max_synthetic_pages {
                Some(n) if n >= 1 => {}
                _ => {
                    return Err(ConfigError::Validation(
                        "max-synthetic-pages must be >= 1 when page-template is set".to_string(),
                    ))
                }
            }
        }
        (Some(_), Some(_)) => {
            return Err(ConfigError::Validation(
                "start-page and page-template are mutually exclusive".to_string(),
            ))
        }
        (None, None) => {
            return Err(ConfigError::Validation(
                "one of start-page or page-template is required".to_string(),
            ))
        }
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !config.weight.is_finite() || config.weight < 0.0 {
        return Err(ConfigError::Validation(format!(
            "weight must be a non-negative number, got {}",
            config.weight
        )));
    }

    // Compiling surfaces malformed patterns before any request is made
    DetailPattern::new(&config.items_url_pattern)?;
    UrlPatternFilter::new(&config.filter_patterns)?;

    for domain in config.allowed_domains.iter().chain(&config.blocked_domains) {
        validate_domain_pattern(domain)?;
    }

    Ok(())
}

/// Validates fetch stage configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    match config.backend {
        BackendKind::Table => {
            let table = config.table_name.as_deref().ok_or_else(|| {
                ConfigError::Validation("table-name is required for the table backend".to_string())
            })?;
            validate_table_name(table).map_err(|e| ConfigError::Validation(e.to_string()))?;

            if config.database_path.is_empty() {
                return Err(ConfigError::Validation(
                    "database-path cannot be empty".to_string(),
                ));
            }
        }
        BackendKind::File => match config.output_file.as_deref() {
            Some(path) if !path.is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(
                    "output-file is required for the file backend".to_string(),
                ))
            }
        },
    }

    Ok(())
}

/// Validates extraction model configuration
fn validate_llm_config(config: &LlmConfig) -> Result<(), ConfigError> {
    if config.model().is_empty() {
        return Err(ConfigError::Validation(
            "llm provider cannot be empty".to_string(),
        ));
    }

    if config.prompt.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm prompt cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "llm timeout-secs must be >= 1".to_string(),
        ));
    }

    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid llm base-url: {}", e)))?;

    Ok(())
}

fn validate_http_url(value: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)
    } else {
        validate_domain_string(pattern)
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
