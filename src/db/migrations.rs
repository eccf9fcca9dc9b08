// Database migrations

use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table to track version
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < 1 {
        migration_001_audit_and_receipts(conn)?;
        set_version(conn, 1)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
}

fn set_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

// Both tables are insert-only; no update or delete path exists in the code
fn migration_001_audit_and_receipts(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS audit (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            request_id TEXT,
            ts TEXT,
            text_redactions TEXT,
            image_masks TEXT,
            placeholders_used TEXT,
            policy_snapshot TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS receipts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            input_hash TEXT,
            timestamp TEXT,
            status TEXT,
            signature TEXT,
            key_version TEXT
        )",
        [],
    )?;
    Ok(())
}
