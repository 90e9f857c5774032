//! Configuration module for Listing-Crawler
//!
//! This module handles loading, merging, and validating TOML configuration
//! files. A run is usually described by a shared base file plus one file per
//! tenant; the tenant file wins wherever both set a value.
//!
//! # Example
//!
//! ```no_run
//! use listing_crawler::config::load_layered_config;
//! use std::path::Path;
//!
//! let (config, hash) =
//!     load_layered_config(Some(Path::new("common.toml")), Path::new("acme.toml")).unwrap();
//! println!("Crawling {} (config {})", config.tenant.name, hash);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackendKind, Config, FetchConfig, LlmConfig, StorageConfig, TenantConfig,
};
pub use validation::PAGE_PLACEHOLDER;

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_layered_config, LLM_TOKEN_ENV};
