// Keychain abstraction for the signing secret
// Pluggable secret lookup: the settings layer consults this after the
// environment and before the dev default. No KMS protocol here.

use anyhow::{Context, Result};
use keyring::Entry;

pub struct Keychain;

impl Keychain {
    pub fn new() -> Self {
        Keychain
    }

    pub fn retrieve(&self, service: &str, name: &str) -> Result<String> {
        let entry = Entry::new(service, name).context("Failed to create keychain entry")?;
        let secret = entry
            .get_password()
            .context("Failed to retrieve secret from keychain")?;
        Ok(secret)
    }
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}
