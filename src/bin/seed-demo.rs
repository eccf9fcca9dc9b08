// Append one demonstration audit row.
// Run with: cargo run --bin seed-demo

use capsule::audit::{AuditEntry, AuditLedger};
use capsule::receipts::utc_now_iso;
use capsule::{Database, Settings};

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    println!("Database path: {:?}", settings.database_path);

    let db = Database::new(settings.database_path)?;
    let ledger = AuditLedger::new(db);

    // placeholders_used carries token keys only; original values never land
    // in the ledger
    let entry = AuditEntry {
        request_id: "demo-1".to_string(),
        ts: utc_now_iso(),
        text_redactions: vec![
            "EMAIL".to_string(),
            "PHONE".to_string(),
            "ADDRESS".to_string(),
        ],
        image_masks: vec![serde_json::json!({ "face": 1 })],
        placeholders_used: vec!["[EMAIL_1]".to_string()],
        policy_snapshot: serde_json::json!({ "text": { "redact": ["EMAIL", "PHONE"] } }),
    };
    ledger.append(&entry)?;

    println!("Seeded demo audit entry {}", entry.request_id);
    Ok(())
}
