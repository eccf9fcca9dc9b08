// Offline receipt check against the configured key registry.
// Run with: cargo run --bin verify-receipt -- <receipt.json>
// Accepts either a bare receipt object or one wrapped as { "receipt": {...} }.

use anyhow::{Context, Result};
use capsule::{Attestation, KeyRegistry, ReceiptSigner, Settings};

fn main() -> Result<()> {
    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("Usage: verify-receipt <receipt.json>");
            std::process::exit(1);
        }
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read receipt file {}", path))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Receipt file is not valid JSON")?;
    let receipt_value = value.get("receipt").cloned().unwrap_or(value);
    let receipt: Attestation =
        serde_json::from_value(receipt_value).context("Receipt object has the wrong shape")?;

    let settings = Settings::from_env();
    let signer = ReceiptSigner::new(KeyRegistry::new(
        &settings.key_version,
        &settings.signing_secret,
        settings.retired_secrets,
    ));

    let valid = signer.verify(
        &receipt.input_hash,
        &receipt.timestamp,
        &receipt.status,
        &receipt.signature,
        &receipt.key_version,
    );
    println!("signature_valid: {}", valid);
    Ok(())
}
