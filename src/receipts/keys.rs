// Key registry for receipt signing
// Active secret plus an append-only list of retired secrets

/// Maps a key version label to a signing secret. Retired secrets carry no
/// version label; they are tried unconditionally during verification so that
/// receipts issued before a rotation stay verifiable.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    active_version: String,
    active_secret: String,
    retired_secrets: Vec<String>,
}

impl KeyRegistry {
    pub fn new(active_version: &str, active_secret: &str, retired_secrets: Vec<String>) -> Self {
        Self {
            active_version: active_version.to_string(),
            active_secret: active_secret.to_string(),
            retired_secrets,
        }
    }

    pub fn active_version(&self) -> &str {
        &self.active_version
    }

    pub fn active_secret(&self) -> &str {
        &self.active_secret
    }

    /// Resolve a version label to its secret. Unknown versions fall back to
    /// the active secret instead of failing (compatibility behavior; see
    /// DESIGN.md).
    pub fn resolve(&self, version: &str) -> &str {
        if version == self.active_version {
            return &self.active_secret;
        }
        &self.active_secret
    }

    pub fn retired_secrets(&self) -> &[String] {
        &self.retired_secrets
    }

    /// Replace the active key, pushing the previous secret onto the retired
    /// list. Retired secrets are never removed.
    pub fn rotate(&mut self, new_version: &str, new_secret: &str) {
        let old_secret = std::mem::replace(&mut self.active_secret, new_secret.to_string());
        self.retired_secrets.push(old_secret);
        self.active_version = new_version.to_string();
    }
}
