// Sanitized Logger
// Structured stderr events that never carry PII or raw payload text

use serde::{Deserialize, Serialize};

/// Safe fields that can be logged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafeLogFields {
    pub request_id: Option<String>,
    pub event_type: Option<String>,
    pub redaction_count: Option<usize>,
    pub category_count: Option<usize>,
    pub ttl_seconds: Option<u64>,
    pub latency_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub error_type: Option<String>, // Error type only, not message
}

/// Sanitized logger that keeps PII out of the process log
#[derive(Debug, Clone, Default)]
pub struct SanitizedLogger;

impl SanitizedLogger {
    pub fn new() -> Self {
        SanitizedLogger
    }

    /// Log an info-level event with safe fields only
    pub fn log_info(&self, event_name: &str, fields: &SafeLogFields) {
        let json = serde_json::to_string(fields).unwrap_or_default();
        eprintln!("[INFO] {}: {}", event_name, json);
    }

    /// Log a warning with safe fields
    pub fn log_warn(&self, event_name: &str, fields: &SafeLogFields) {
        let json = serde_json::to_string(fields).unwrap_or_default();
        eprintln!("[WARN] {}: {}", event_name, json);
    }

    /// Log an error with safe fields only (no raw error messages that might
    /// contain PII)
    pub fn log_error(&self, event_name: &str, error_type: &str, fields: &SafeLogFields) {
        let mut safe_fields = fields.clone();
        safe_fields.error_type = Some(error_type.to_string());
        let json = serde_json::to_string(&safe_fields).unwrap_or_default();
        eprintln!("[ERROR] {}: {}", event_name, json);
    }

    /// Strip email/URL/phone-shaped substrings from an error message before
    /// it is allowed anywhere near a log line
    pub fn sanitize_error_message(&self, message: &str) -> String {
        let mut sanitized = message.to_string();

        if let Ok(re) = regex::Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}") {
            sanitized = re.replace_all(&sanitized, "[REDACTED_EMAIL]").to_string();
        }
        if let Ok(re) = regex::Regex::new(r"https?://[^\s]+") {
            sanitized = re.replace_all(&sanitized, "[REDACTED_URL]").to_string();
        }
        if let Ok(re) = regex::Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b") {
            sanitized = re.replace_all(&sanitized, "[REDACTED_PHONE]").to_string();
        }

        if sanitized.len() > 200 {
            let cut = sanitized
                .char_indices()
                .take_while(|(i, _)| *i < 200)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            sanitized = format!("{}...[truncated]", &sanitized[..cut]);
        }

        sanitized
    }

    /// Create a safe fields builder
    pub fn fields() -> SafeLogFieldsBuilder {
        SafeLogFieldsBuilder::default()
    }
}

/// Builder for SafeLogFields
#[derive(Default)]
pub struct SafeLogFieldsBuilder {
    fields: SafeLogFields,
}

impl SafeLogFieldsBuilder {
    pub fn request_id(mut self, id: &str) -> Self {
        self.fields.request_id = Some(id.to_string());
        self
    }

    pub fn event_type(mut self, event: &str) -> Self {
        self.fields.event_type = Some(event.to_string());
        self
    }

    pub fn redaction_count(mut self, count: usize) -> Self {
        self.fields.redaction_count = Some(count);
        self
    }

    pub fn category_count(mut self, count: usize) -> Self {
        self.fields.category_count = Some(count);
        self
    }

    pub fn ttl_seconds(mut self, ttl: u64) -> Self {
        self.fields.ttl_seconds = Some(ttl);
        self
    }

    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.fields.latency_ms = Some(ms);
        self
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.fields.status_code = Some(code);
        self
    }

    pub fn build(self) -> SafeLogFields {
        self.fields
    }
}
