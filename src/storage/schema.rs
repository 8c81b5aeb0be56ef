//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Dock-Tally database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track collection runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    sources_ok INTEGER NOT NULL DEFAULT 0,
    sources_failed INTEGER NOT NULL DEFAULT 0
);

-- One row per aggregated shipment group
CREATE TABLE IF NOT EXISTS shipment_groups (
    report_id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    delivery_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    unload_started_at TEXT,
    closed_at TEXT,
    status TEXT NOT NULL,
    sent INTEGER NOT NULL DEFAULT 0,
    received INTEGER NOT NULL DEFAULT 0,
    excess INTEGER NOT NULL DEFAULT 0,
    group_index INTEGER NOT NULL,
    boxes_count INTEGER NOT NULL,
    unload_duration_seconds INTEGER NOT NULL DEFAULT 0,
    run_stamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_groups_date ON shipment_groups(delivery_date);
CREATE INDEX IF NOT EXISTS idx_groups_source ON shipment_groups(source_id);
CREATE INDEX IF NOT EXISTS idx_groups_stamp ON shipment_groups(source_id, delivery_date, run_stamp);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
