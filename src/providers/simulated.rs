// Simulated provider used when no AI endpoint is configured
// Echoes a truncated sanitized prompt so the submission path stays testable

use crate::providers::adapter_trait::CompletionProvider;
use crate::receipts::utc_now_iso;
use anyhow::Result;

const ECHO_LIMIT: usize = 120;

pub struct SimulatedProvider;

#[async_trait::async_trait]
impl CompletionProvider for SimulatedProvider {
    async fn complete(&self, sanitized_prompt: &str) -> Result<String> {
        let echo: String = sanitized_prompt.chars().take(ECHO_LIMIT).collect();
        Ok(format!(
            "[dummy completion at {}] You said: {}",
            utc_now_iso(),
            echo
        ))
    }
}
