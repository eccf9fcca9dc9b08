// Receipt protocol: signed attestations cross-checked against the presence
// vault to decide whether a receipt may be honored as verified deletion

pub mod keys;
pub mod signing;

pub use keys::KeyRegistry;
pub use signing::{sha256_hex, ReceiptSigner};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::audit::LedgerError;
use crate::db::Database;
use crate::vault::PresenceVault;

/// Processing status carried by a signed receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    NotYetDeleted,
    Deleted,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::NotYetDeleted => "not_yet_deleted",
            ReceiptStatus::Deleted => "deleted",
        }
    }
}

/// Receipt returned at issuance. `ttl_seconds` reports the vault tombstone's
/// effective lifetime (0 when the vault was unavailable); it is not part of
/// the signed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedReceipt {
    pub input_hash: String,
    pub timestamp: String,
    pub status: ReceiptStatus,
    pub signature: String,
    pub key_version: String,
    pub ttl_seconds: u64,
}

/// Attestation as presented on the verification boundary. Fields arrive from
/// untrusted callers, so everything defaults rather than erroring; a missing
/// or mangled field simply fails signature verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attestation {
    #[serde(default)]
    pub input_hash: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default = "default_key_version")]
    pub key_version: String,
}

fn default_key_version() -> String {
    "v1".to_string()
}

/// Outcome of a verification request. `verified` requires both a valid
/// signature and vault absence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub signature_valid: bool,
    pub verified: bool,
    pub data_present_in_vault: bool,
}

/// Current UTC time as an ISO-8601 string with microsecond precision.
pub fn utc_now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Issue a receipt for a fingerprint: record the vault tombstone, sign the
/// attestation under the active key, and persist the receipt row. Vault
/// trouble degrades to `ttl_seconds = 0`; a ledger write failure is a hard
/// error.
pub fn issue_receipt(
    signer: &ReceiptSigner,
    vault: &PresenceVault,
    db: &Database,
    input_hash: &str,
    ttl_seconds: u64,
) -> Result<IssuedReceipt, LedgerError> {
    let timestamp = utc_now_iso();
    let status = ReceiptStatus::NotYetDeleted;

    let ttl = vault.record(input_hash, ttl_seconds);
    let (signature, key_version) = signer.sign(input_hash, &timestamp, status, None);

    let receipt = IssuedReceipt {
        input_hash: input_hash.to_string(),
        timestamp,
        status,
        signature,
        key_version,
        ttl_seconds: ttl,
    };
    persist_receipt(db, &receipt)?;
    Ok(receipt)
}

/// Verify an attestation: signature across active and retired secrets, then
/// the presence vault. The receipt counts as verified deletion only when the
/// signature holds and the vault no longer has the fingerprint.
pub fn verify_deletion(
    signer: &ReceiptSigner,
    vault: &PresenceVault,
    attestation: &Attestation,
) -> VerificationOutcome {
    let signature_valid = signer.verify(
        &attestation.input_hash,
        &attestation.timestamp,
        &attestation.status,
        &attestation.signature,
        &attestation.key_version,
    );

    let data_present_in_vault =
        !attestation.input_hash.is_empty() && vault.is_present(&attestation.input_hash);

    VerificationOutcome {
        signature_valid,
        verified: signature_valid && !data_present_in_vault,
        data_present_in_vault,
    }
}

// Receipts are append-only, like the audit table
fn persist_receipt(db: &Database, receipt: &IssuedReceipt) -> Result<(), LedgerError> {
    db.with_connection(|conn| {
        conn.execute(
            "INSERT INTO receipts (input_hash, timestamp, status, signature, key_version)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                receipt.input_hash,
                receipt.timestamp,
                receipt.status.as_str(),
                receipt.signature,
                receipt.key_version
            ],
        )
    })??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{MemoryVaultStore, PresenceVault};
    use std::sync::Arc;

    fn test_db() -> Database {
        let path = std::env::temp_dir().join(format!("capsule-test-{}.db", uuid::Uuid::new_v4()));
        Database::new(path).unwrap()
    }

    fn test_signer() -> ReceiptSigner {
        ReceiptSigner::new(KeyRegistry::new("v1", "devsecret", vec![]))
    }

    #[test]
    fn test_issue_then_verify_with_tombstone_present() {
        let signer = test_signer();
        let vault = PresenceVault::new(Some(Arc::new(MemoryVaultStore::new())));
        let db = test_db();

        let hash = sha256_hex(b"the original input");
        let receipt = issue_receipt(&signer, &vault, &db, &hash, 60).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::NotYetDeleted);
        assert_eq!(receipt.ttl_seconds, 60);

        let outcome = verify_deletion(
            &signer,
            &vault,
            &Attestation {
                input_hash: receipt.input_hash.clone(),
                timestamp: receipt.timestamp.clone(),
                status: receipt.status.as_str().to_string(),
                signature: receipt.signature.clone(),
                key_version: receipt.key_version.clone(),
            },
        );

        // Valid signature, but the tombstone has not expired: not verified
        assert!(outcome.signature_valid);
        assert!(outcome.data_present_in_vault);
        assert!(!outcome.verified);
    }

    #[test]
    fn test_verified_once_vault_entry_expires() {
        let signer = test_signer();
        let vault = PresenceVault::new(Some(Arc::new(MemoryVaultStore::new())));
        let db = test_db();

        let hash = sha256_hex(b"short lived");
        // TTL 0 expires immediately; lazy read must already report absence
        let receipt = issue_receipt(&signer, &vault, &db, &hash, 0).unwrap();

        let outcome = verify_deletion(
            &signer,
            &vault,
            &Attestation {
                input_hash: receipt.input_hash,
                timestamp: receipt.timestamp,
                status: receipt.status.as_str().to_string(),
                signature: receipt.signature,
                key_version: receipt.key_version,
            },
        );

        assert!(outcome.signature_valid);
        assert!(!outcome.data_present_in_vault);
        assert!(outcome.verified);
    }

    #[test]
    fn test_tampered_attestation_never_verifies() {
        let signer = test_signer();
        let vault = PresenceVault::unconfigured();
        let db = test_db();

        let receipt = issue_receipt(&signer, &vault, &db, "deadbeef", 10).unwrap();
        // Unconfigured vault: fail-open, no tombstone recorded
        assert_eq!(receipt.ttl_seconds, 0);

        let outcome = verify_deletion(
            &signer,
            &vault,
            &Attestation {
                input_hash: receipt.input_hash,
                timestamp: receipt.timestamp,
                status: "deleted".to_string(), // flipped signed field
                signature: receipt.signature,
                key_version: receipt.key_version,
            },
        );

        assert!(!outcome.signature_valid);
        assert!(!outcome.verified);
    }

    #[test]
    fn test_attestation_defaults_for_missing_fields() {
        let attestation: Attestation = serde_json::from_str("{}").unwrap();
        assert_eq!(attestation.key_version, "v1");
        assert_eq!(attestation.input_hash, "");
        assert_eq!(attestation.signature, "");
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = utc_now_iso();
        assert!(ts.ends_with('Z'));
        assert!(!ts.contains('|'));
        // microsecond precision: 2025-01-15T09:30:00.123456Z
        assert_eq!(ts.len(), 27);
    }
}
