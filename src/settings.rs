// Process configuration resolved from the environment at startup
// All variables use the CAPSULE_ prefix; the signing secret additionally
// falls back to the OS keychain before the dev default

use std::env;
use std::path::PathBuf;

use crate::keychain::Keychain;
use crate::privacy::placeholders::Category;

pub const KEYCHAIN_SERVICE: &str = "capsule";
pub const KEYCHAIN_SECRET_ENTRY: &str = "signing-secret";

const DEV_SECRET: &str = "devsecret";
const DEFAULT_ORIGINS: &str =
    "http://localhost:19006,http://localhost:8081,http://localhost:5173,http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultMode {
    Memory,
    Off,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub signing_secret: String,
    pub key_version: String,
    pub retired_secrets: Vec<String>,
    pub receipt_ttl_seconds: u64,
    pub allowed_origins: Vec<String>,
    pub database_path: PathBuf,
    pub vault_mode: VaultMode,
    pub redact_categories: Vec<Category>,
    pub ai_endpoint: Option<String>,
    pub ai_api_key: Option<String>,
    pub http_port: u16,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            signing_secret: resolve_signing_secret(),
            key_version: env::var("CAPSULE_KEY_VERSION").unwrap_or_else(|_| "v1".to_string()),
            retired_secrets: parse_list(
                &env::var("CAPSULE_RETIRED_SECRETS").unwrap_or_default(),
            ),
            receipt_ttl_seconds: env::var("CAPSULE_RECEIPT_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            allowed_origins: parse_list(
                &env::var("CAPSULE_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string()),
            ),
            database_path: env::var("CAPSULE_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./capsule.db")),
            vault_mode: parse_vault_mode(
                &env::var("CAPSULE_VAULT").unwrap_or_else(|_| "memory".to_string()),
            ),
            redact_categories: resolve_categories(
                env::var("CAPSULE_REDACT_CATEGORIES").ok().as_deref(),
            ),
            ai_endpoint: env::var("CAPSULE_AI_ENDPOINT").ok().filter(|s| !s.is_empty()),
            ai_api_key: env::var("CAPSULE_AI_API_KEY").ok().filter(|s| !s.is_empty()),
            http_port: env::var("CAPSULE_HTTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
        }
    }
}

fn resolve_signing_secret() -> String {
    if let Ok(secret) = env::var("CAPSULE_SIGNING_SECRET") {
        if !secret.is_empty() {
            return secret;
        }
    }
    if let Ok(secret) = Keychain::new().retrieve(KEYCHAIN_SERVICE, KEYCHAIN_SECRET_ENTRY) {
        return secret;
    }
    DEV_SECRET.to_string()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_vault_mode(raw: &str) -> VaultMode {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => VaultMode::Off,
        _ => VaultMode::Memory,
    }
}

fn resolve_categories(raw: Option<&str>) -> Vec<Category> {
    match raw {
        Some(value) if !value.trim().is_empty() => Category::parse_list(&parse_list(value)),
        _ => Category::all(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_empties() {
        assert_eq!(
            parse_list(" a, b ,,c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_vault_mode() {
        assert_eq!(parse_vault_mode("off"), VaultMode::Off);
        assert_eq!(parse_vault_mode("OFF"), VaultMode::Off);
        assert_eq!(parse_vault_mode("memory"), VaultMode::Memory);
        assert_eq!(parse_vault_mode("anything-else"), VaultMode::Memory);
    }

    #[test]
    fn test_resolve_categories() {
        assert_eq!(resolve_categories(None), Category::all());
        assert_eq!(resolve_categories(Some("  ")), Category::all());
        assert_eq!(
            resolve_categories(Some("EMAIL,BOGUS,NAME")),
            vec![Category::Email, Category::Name]
        );
    }
}
