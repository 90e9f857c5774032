//! URL handling module for Listing-Crawler
//!
//! This module provides URL normalization, host extraction, wildcard domain
//! matching, and the internal/external link test used by discovery.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, is_internal, matches_wildcard};
pub use normalize::normalize_url;
