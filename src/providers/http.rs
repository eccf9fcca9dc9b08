// Generic HTTP adapter for OpenAI-compatible chat completion endpoints
// No provider-specific prompt engineering; the sanitized prompt goes out as
// a single user message

use crate::providers::adapter_trait::CompletionProvider;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct HttpProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpProvider {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        HttpProvider {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.map(|k| k.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(&self, sanitized_prompt: &str) -> Result<String> {
        let body = json!({
            "model": "default",
            "messages": [
                { "role": "user", "content": sanitized_prompt }
            ],
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .context("Failed to send completion request")?;

        if !response.status().is_success() {
            anyhow::bail!("Provider error: {}", response.status());
        }

        let json: Value = response.json().await?;
        let choice = json["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

        let text = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("No content in response"))?
            .to_string();

        Ok(text)
    }
}
