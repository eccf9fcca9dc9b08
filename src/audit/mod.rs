// Append-only audit ledger
// Records redaction metadata for compliance review; writes are hard failures,
// unlike vault operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, LockPoisoned};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger write failed: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("ledger serialization failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("ledger lock poisoned")]
    Lock,
}

impl From<LockPoisoned> for LedgerError {
    fn from(_: LockPoisoned) -> Self {
        LedgerError::Lock
    }
}

/// One immutable ledger row. `placeholders_used` holds placeholder token
/// keys only, never the original values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub request_id: String,
    pub ts: String,
    pub text_redactions: Vec<String>,
    pub image_masks: Vec<serde_json::Value>,
    pub placeholders_used: Vec<String>,
    pub policy_snapshot: serde_json::Value,
}

pub struct AuditLedger {
    db: Database,
}

impl AuditLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert one row. There is no update or delete counterpart.
    pub fn append(&self, entry: &AuditEntry) -> Result<(), LedgerError> {
        let text_redactions = serde_json::to_string(&entry.text_redactions)?;
        let image_masks = serde_json::to_string(&entry.image_masks)?;
        let placeholders_used = serde_json::to_string(&entry.placeholders_used)?;
        let policy_snapshot = serde_json::to_string(&entry.policy_snapshot)?;

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO audit (request_id, ts, text_redactions, image_masks, placeholders_used, policy_snapshot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    entry.request_id,
                    entry.ts,
                    text_redactions,
                    image_masks,
                    placeholders_used,
                    policy_snapshot
                ],
            )
        })??;
        Ok(())
    }

    /// Export rows as CSV, optionally bounded by inclusive timestamps,
    /// ascending by `ts`.
    pub fn export_csv(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<String, LedgerError> {
        let mut query = String::from(
            "SELECT request_id, ts, text_redactions, image_masks, placeholders_used FROM audit",
        );
        let mut params: Vec<String> = Vec::new();
        match (from, to) {
            (Some(f), Some(t)) => {
                query.push_str(" WHERE ts BETWEEN ?1 AND ?2");
                params.push(f.to_string());
                params.push(t.to_string());
            }
            (Some(f), None) => {
                query.push_str(" WHERE ts >= ?1");
                params.push(f.to_string());
            }
            (None, Some(t)) => {
                query.push_str(" WHERE ts <= ?1");
                params.push(t.to_string());
            }
            (None, None) => {}
        }
        query.push_str(" ORDER BY ts ASC");

        self.db.with_connection(|conn| -> Result<String, LedgerError> {
            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?;

            let mut output =
                String::from("request_id,ts,text_redactions,image_masks,placeholders_used\r\n");
            for row in rows {
                let (request_id, ts, redactions, masks, placeholders) = row?;
                let fields = [
                    request_id.unwrap_or_default(),
                    ts.unwrap_or_default(),
                    redactions.unwrap_or_else(|| "[]".to_string()),
                    masks.unwrap_or_else(|| "[]".to_string()),
                    placeholders.unwrap_or_else(|| "[]".to_string()),
                ];
                let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
                output.push_str(&line.join(","));
                output.push_str("\r\n");
            }
            Ok(output)
        })?
    }
}

// Quote fields containing delimiter, quote, or newline; double embedded quotes
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
