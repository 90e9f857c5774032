//! Structured extraction from crawled pages
//!
//! An [`Extractor`] turns a fetched page's markdown into a [`Property`]. The
//! schema and instruction prompt are fixed when the extractor is built.

mod openai;
mod property;

pub use openai::OpenAiExtractor;
pub use property::{Area, Location, Operation, Property, TaxPeriod, DEFAULT_AREA_UNIT};

use async_trait::async_trait;
use thiserror::Error;

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response or an unusable reply envelope
    #[error("API error: {0}")]
    Api(String),

    /// The reply could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Turns page content into a structured listing
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extracts a listing from one page
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Property))` - A listing was extracted
    /// * `Ok(None)` - The page yielded nothing usable; it is still recorded
    /// * `Err(ExtractError)` - Extraction failed; the page is skipped
    async fn extract(&self, url: &str, markdown: &str) -> ExtractResult<Option<Property>>;
}

/// Extractor that never produces a payload
///
/// Used when no model is configured: pages are recorded with their content
/// only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

#[async_trait]
impl Extractor for NoopExtractor {
    async fn extract(&self, _url: &str, _markdown: &str) -> ExtractResult<Option<Property>> {
        Ok(None)
    }
}
