use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use toml::Value;

/// Environment variable overriding `llm.api-token`
pub const LLM_TOKEN_ENV: &str = "LLM_API_TOKEN";

/// Loads and parses a single configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use listing_crawler::config::load_config;
///
/// let config = load_config(Path::new("acme.toml")).unwrap();
/// println!("Tenant: {}", config.tenant.name);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_layered_config(None, path).map(|(config, _)| config)
}

/// Loads a base file and a tenant file, merging the tenant over the base
///
/// Tables are merged key by key; any other value in the tenant file replaces
/// the base value. The merged document is deserialized, the
/// `LLM_API_TOKEN` override is applied and the result is validated.
///
/// # Returns
///
/// * `Ok((Config, String))` - The configuration and the hex SHA-256 of the merged document
/// * `Err(ConfigError)` - Failed to read, parse, merge or validate
pub fn load_layered_config(
    base: Option<&Path>,
    tenant: &Path,
) -> Result<(Config, String), ConfigError> {
    let mut merged = match base {
        Some(base_path) => read_toml(base_path)?,
        None => Value::Table(Default::default()),
    };
    merge_values(&mut merged, read_toml(tenant)?);

    let hash = compute_config_hash(&merged)?;

    let mut config: Config = merged.try_into()?;
    apply_env_overrides(&mut config);

    validate(&config)?;

    Ok((config, hash))
}

/// Computes a SHA-256 hash of a configuration document
///
/// The hash identifies the effective configuration of a run in the logs.
pub fn compute_config_hash(document: &Value) -> Result<String, ConfigError> {
    let content = toml::to_string(document)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn read_toml(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Deep-merges `overlay` into `base`
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(llm) = config.llm.as_mut() {
        if let Ok(token) = std::env::var(LLM_TOKEN_ENV) {
            if !token.is_empty() {
                llm.api_token = Some(token);
            }
        }
    }
}
