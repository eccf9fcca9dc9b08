// Privacy module - reversible placeholder substitution and PII-free logging

pub mod placeholders;
pub mod sanitized_logger;

pub use placeholders::{Category, PlaceholderEngine, PlaceholderMap, RedactionResult};
pub use sanitized_logger::{SafeLogFields, SanitizedLogger};
