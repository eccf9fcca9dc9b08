// Presence vault: TTL-expiring store proving transient sensitive data is no
// longer retained. Fails open to "absent" so receipt issuance never blocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::privacy::sanitized_logger::SanitizedLogger;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault store unavailable: {0}")]
    Unavailable(String),
}

/// Single-key operations the vault needs from its backing store. The store
/// handles its own atomicity; callers never coordinate beyond one call.
pub trait VaultStore: Send + Sync {
    fn set_with_expiry(&self, key: &str, ttl_seconds: u64) -> Result<(), VaultError>;
    fn exists(&self, key: &str) -> Result<bool, VaultError>;
}

/// In-process store: lock-protected map with lazy expiry. Reads treat an
/// expired-but-unswept entry as absent; writes sweep expired entries so the
/// map does not grow without bound.
#[derive(Default)]
pub struct MemoryVaultStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

impl VaultStore for MemoryVaultStore {
    fn set_with_expiry(&self, key: &str, ttl_seconds: u64) -> Result<(), VaultError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::Unavailable(format!("lock poisoned: {}", e)))?;
        let now = Instant::now();
        entries.retain(|_, expires_at| *expires_at > now);
        // Last-writer-wins: a re-record replaces the prior expiry. An absurd
        // TTL saturates to a far-future expiry instead of overflowing Instant
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365));
        entries.insert(key.to_string(), expires_at);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, VaultError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| VaultError::Unavailable(format!("lock poisoned: {}", e)))?;
        Ok(entries
            .get(key)
            .map(|expires_at| *expires_at > Instant::now())
            .unwrap_or(false))
    }
}

/// Fail-open façade over an optional store. An unconfigured or failing store
/// means presence cannot be proven: `record` reports an effective TTL of 0
/// and `is_present` answers absent, with a `vault_degraded` event on the
/// sanitized log.
pub struct PresenceVault {
    store: Option<Arc<dyn VaultStore>>,
    logger: SanitizedLogger,
}

impl PresenceVault {
    pub fn new(store: Option<Arc<dyn VaultStore>>) -> Self {
        Self {
            store,
            logger: SanitizedLogger::new(),
        }
    }

    pub fn unconfigured() -> Self {
        Self::new(None)
    }

    /// Record a tombstone for the fingerprint, returning the effective TTL.
    /// Never blocks receipt issuance: degradation returns 0.
    pub fn record(&self, fingerprint: &str, ttl_seconds: u64) -> u64 {
        let store = match &self.store {
            Some(s) => s,
            None => {
                self.log_degraded("record", "unconfigured");
                return 0;
            }
        };
        match store.set_with_expiry(fingerprint, ttl_seconds) {
            Ok(()) => ttl_seconds,
            Err(e) => {
                self.log_degraded("record", &error_label(&e));
                0
            }
        }
    }

    /// True iff the fingerprint has an unexpired entry. Unavailability reads
    /// as absence: the vault can fail toward "cannot prove presence" but
    /// never toward "present".
    pub fn is_present(&self, fingerprint: &str) -> bool {
        let store = match &self.store {
            Some(s) => s,
            None => return false,
        };
        match store.exists(fingerprint) {
            Ok(present) => present,
            Err(e) => {
                self.log_degraded("is_present", &error_label(&e));
                false
            }
        }
    }

    // error_type only; the underlying message may embed connection details
    fn log_degraded(&self, operation: &str, error_type: &str) {
        let fields = SanitizedLogger::fields().event_type(operation).build();
        self.logger.log_error("vault_degraded", error_type, &fields);
    }
}

fn error_label(e: &VaultError) -> String {
    match e {
        VaultError::Unavailable(_) => "unavailable".to_string(),
    }
}
