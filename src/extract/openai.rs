//! Extraction through an OpenAI-compatible chat completions API

use super::{ExtractError, ExtractResult, Extractor, Property};
use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Pages longer than this are truncated before being sent to the model
const MAX_CONTENT_CHARS: usize = 60_000;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Extractor calling `{base_url}/chat/completions` in JSON mode
pub struct OpenAiExtractor {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
    model: String,
    system_prompt: String,
}

impl OpenAiExtractor {
    /// Builds an extractor from the `[llm]` configuration
    ///
    /// The JSON schema of [`Property`] is appended to the configured prompt.
    pub fn new(config: &LlmConfig) -> ExtractResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let schema = serde_json::to_string(&schemars::schema_for!(Property))
            .map_err(|e| ExtractError::Parse(format!("Failed to render schema: {}", e)))?;

        let system_prompt = format!(
            "{}\n\nRespond with a single JSON object matching this JSON schema:\n{}",
            config.prompt.trim(),
            schema
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            model: config.model().to_string(),
            system_prompt,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, url: &str, markdown: &str) -> ExtractResult<Option<String>> {
        let content: String = markdown.chars().take(MAX_CONTENT_CHARS).collect();
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": format!("URL: {}\n\n{}", url, content) },
            ],
        });

        let mut request = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api(format!("{}: {}", status, error_text)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Api(format!("Unexpected response body: {}", e)))?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract(&self, url: &str, markdown: &str) -> ExtractResult<Option<Property>> {
        let Some(content) = self.complete(url, markdown).await? else {
            tracing::warn!("Model returned no content for {}", url);
            return Ok(None);
        };

        match parse_property(&content) {
            Some(property) => Ok(Some(property)),
            None => {
                tracing::warn!("Could not parse extracted content for {}", url);
                Ok(None)
            }
        }
    }
}

/// Decodes model output into a property
///
/// Accepts a single object or an array (first element wins). Anything else,
/// including an empty reply, yields `None`.
fn parse_property(content: &str) -> Option<Property> {
    let value: Value = serde_json::from_str(content.trim()).ok()?;
    let object = match value {
        Value::Array(items) => items.into_iter().next()?,
        other => other,
    };
    if !object.is_object() {
        return None;
    }
    serde_json::from_value(object).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn llm_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            provider: "openai/gpt-4o-mini".to_string(),
            base_url: base_url.to_string(),
            api_token: Some("sk-test".to_string()),
            prompt: "Extract the listing.".to_string(),
            timeout_secs: 5,
        }
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    async fn extractor(server: &MockServer) -> OpenAiExtractor {
        OpenAiExtractor::new(&llm_config(&server.uri())).unwrap()
    }

    #[test]
    fn test_parse_object_and_array() {
        let single = parse_property(r#"{"reference": "A1", "bedrooms": 2}"#).unwrap();
        assert_eq!(single.reference.as_deref(), Some("A1"));

        let first = parse_property(r#"[{"reference": "A1"}, {"reference": "A2"}]"#).unwrap();
        assert_eq!(first.reference.as_deref(), Some("A1"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_property("").is_none());
        assert!(parse_property("[]").is_none());
        assert!(parse_property("\"text\"").is_none());
        assert!(parse_property(r#"{"bedrooms": "many"}"#).is_none());
    }

    #[tokio::test]
    async fn test_extracts_property() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"reference": "TE01202", "operation": "RENT", "rent_price": 3200}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let extractor = extractor(&server).await;
        assert_eq!(extractor.model(), "gpt-4o-mini");

        let property = extractor
            .extract("https://acme.com/imovel/1", "# Apartamento")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.reference.as_deref(), Some("TE01202"));
        assert_eq!(property.rent_price, Some(3200.0));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json")))
            .mount(&server)
            .await;

        let result = extractor(&server)
            .await
            .extract("https://acme.com/imovel/1", "# Apartamento")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let result = extractor(&server)
            .await
            .extract("https://acme.com/imovel/1", "# Apartamento")
            .await;
        assert!(matches!(result, Err(ExtractError::Api(_))));
    }

    #[tokio::test]
    async fn test_network_error() {
        // Nothing listens on the discard port
        let extractor = OpenAiExtractor::new(&llm_config("http://127.0.0.1:9")).unwrap();
        let result = extractor.extract("https://acme.com/imovel/1", "# A").await;
        assert!(matches!(result, Err(ExtractError::Network(_))));
    }
}
