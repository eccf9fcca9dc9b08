// Provider adapters module

pub mod adapter_trait;
pub mod http;
pub mod simulated;

pub use adapter_trait::CompletionProvider;
pub use http::HttpProvider;
pub use simulated::SimulatedProvider;

use crate::settings::Settings;
use std::sync::Arc;

/// Pick the provider for the configured endpoint; falls back to the
/// simulated echo provider when none is set.
pub fn provider_from_settings(settings: &Settings) -> Arc<dyn CompletionProvider> {
    match &settings.ai_endpoint {
        Some(endpoint) => Arc::new(HttpProvider::new(endpoint, settings.ai_api_key.as_deref())),
        None => Arc::new(SimulatedProvider),
    }
}
