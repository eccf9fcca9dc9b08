// Capsule privacy service
// Redacts PII before third-party AI calls and issues signed, vault-checked
// deletion receipts

pub mod audit;
pub mod db;
pub mod http_server;
pub mod keychain;
pub mod privacy;
pub mod providers;
pub mod rate_limit;
pub mod receipts;
pub mod settings;
pub mod vault;

// Re-export the items the binaries need
pub use db::Database;
pub use http_server::AppState;
pub use privacy::{Category, PlaceholderEngine, PlaceholderMap, RedactionResult};
pub use receipts::{
    sha256_hex, Attestation, IssuedReceipt, KeyRegistry, ReceiptSigner, ReceiptStatus,
    VerificationOutcome,
};
pub use settings::Settings;
pub use vault::{MemoryVaultStore, PresenceVault, VaultStore};
