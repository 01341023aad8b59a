//! Anthropic Messages API client
//!
//! Non-streaming HTTP client for the computer-use tool beta.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::{Config, DriverError, Result};
use crate::llm::traits::{MessageRequest, ModelClient, ModelResponse};

const API_VERSION: &str = "2023-06-01";
const COMPUTER_USE_BETA: &str = "computer-use-2024-10-22";

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    url: String,
    api_key: String,
}

impl AnthropicClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.anthropic.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.messages_url(),
            api_key,
        })
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn create_message(&self, request: &MessageRequest<'_>) -> Result<ModelResponse> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("anthropic-beta", COMPUTER_USE_BETA)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    DriverError::api(format!("Cannot connect to {}: {}", self.url, e))
                } else {
                    DriverError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DriverError::api(format!(
                "Messages API error ({}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let parsed: ModelResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let mut config = Config::default();
        config.anthropic.api_key = None;
        let err = AnthropicClient::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_url_from_config() {
        let mut config = Config::default();
        config.anthropic.api_key = Some("sk-test".to_string());
        config.anthropic.base_url = "http://127.0.0.1:9".to_string();
        let client = AnthropicClient::from_config(&config).unwrap();
        assert_eq!(client.url, "http://127.0.0.1:9/v1/messages");
        assert_eq!(client.name(), "anthropic");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let mut config = Config::default();
        config.anthropic.api_key = Some("sk-test".to_string());
        config.anthropic.base_url = "http://127.0.0.1:9".to_string();
        config.anthropic.timeout_secs = 2;
        let client = AnthropicClient::from_config(&config).unwrap();

        let messages = vec![crate::core::Message::user("Hello")];
        let request = MessageRequest {
            model: "m",
            max_tokens: 8,
            system: None,
            messages: &messages,
            tools: &[],
        };
        assert!(client.create_message(&request).await.is_err());
    }
}
