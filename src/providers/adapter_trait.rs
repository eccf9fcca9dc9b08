// Completion provider trait
// The prompt handed to a provider is always the sanitized text; nothing on
// this boundary ever sees the original input

use anyhow::Result;

#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, sanitized_prompt: &str) -> Result<String>;
}
