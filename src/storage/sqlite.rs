//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::batch::GroupStatus;
use crate::shipment::timestamp::{format_date, format_timestamp};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{GroupRecord, RunRecord, RunStatus};
use crate::CollectorError;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, sources_ok, sources_failed";

const GROUP_COLUMNS: &str = "report_id, source_id, delivery_date, created_at, \
     unload_started_at, closed_at, status, sent, received, excess, group_index, \
     boxes_count, unload_duration_seconds, run_stamp";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CollectorError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CollectorError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, used by dry runs and tests
    pub fn open_in_memory() -> Result<Self, CollectorError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Runs a group query whose `{}` placeholder takes the column list
    fn query_groups(&self, sql: &str, date: NaiveDate) -> StorageResult<Vec<GroupRecord>> {
        let mut stmt = self.conn.prepare(&sql.replacen("{}", GROUP_COLUMNS, 1))?;

        let records = stmt
            .query_map(params![format_date(&date)], group_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| match e {
                rusqlite::Error::InvalidColumnType(_, value, _) => {
                    StorageError::Corrupt(format!("unknown group status '{}'", value))
                }
                other => StorageError::Sqlite(other),
            })?;

        Ok(records)
    }
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(4)?;
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Running),
        sources_ok: row.get(5)?,
        sources_failed: row.get(6)?,
    })
}

fn group_from_row(row: &Row) -> rusqlite::Result<GroupRecord> {
    let status: String = row.get(6)?;
    let status = GroupStatus::from_db_string(&status)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(6, status, Type::Text))?;

    Ok(GroupRecord {
        report_id: row.get(0)?,
        source_id: row.get(1)?,
        delivery_date: row.get(2)?,
        created_at: row.get(3)?,
        unload_started_at: row.get(4)?,
        closed_at: row.get(5)?,
        status,
        sent: row.get::<_, i64>(7)? as u64,
        received: row.get::<_, i64>(8)? as u64,
        excess: row.get::<_, i64>(9)? as u64,
        group_index: row.get(10)?,
        boxes_count: row.get(11)?,
        unload_duration_seconds: row.get(12)?,
        run_stamp: row.get(13)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, started_at: NaiveDateTime) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                format_timestamp(&started_at),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        finished_at: NaiveDateTime,
        sources_ok: u32,
        sources_failed: u32,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, sources_ok = ?3, sources_failed = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                format_timestamp(&finished_at),
                sources_ok,
                sources_failed,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Groups =====

    fn save_group(&mut self, record: &GroupRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO shipment_groups (
                report_id, source_id, delivery_date, created_at, unload_started_at,
                closed_at, status, sent, received, excess, group_index, boxes_count,
                unload_duration_seconds, run_stamp
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(report_id) DO UPDATE SET
                source_id = excluded.source_id,
                delivery_date = excluded.delivery_date,
                created_at = excluded.created_at,
                unload_started_at = excluded.unload_started_at,
                closed_at = excluded.closed_at,
                status = excluded.status,
                sent = excluded.sent,
                received = excluded.received,
                excess = excluded.excess,
                group_index = excluded.group_index,
                boxes_count = excluded.boxes_count,
                unload_duration_seconds = excluded.unload_duration_seconds,
                run_stamp = excluded.run_stamp",
            params![
                record.report_id,
                record.source_id,
                record.delivery_date,
                record.created_at,
                record.unload_started_at,
                record.closed_at,
                record.status.to_db_string(),
                record.sent as i64,
                record.received as i64,
                record.excess as i64,
                record.group_index,
                record.boxes_count,
                record.unload_duration_seconds,
                record.run_stamp,
            ],
        )?;
        Ok(())
    }

    fn groups_for_date(&self, date: NaiveDate) -> StorageResult<Vec<GroupRecord>> {
        self.query_groups(
            "SELECT {} FROM shipment_groups WHERE delivery_date = ?1
             ORDER BY source_id, group_index",
            date,
        )
    }

    fn latest_groups_for_date(&self, date: NaiveDate) -> StorageResult<Vec<GroupRecord>> {
        self.query_groups(
            "SELECT {} FROM shipment_groups g WHERE delivery_date = ?1
               AND run_stamp = (
                 SELECT MAX(l.run_stamp) FROM shipment_groups l
                 WHERE l.source_id = g.source_id AND l.delivery_date = g.delivery_date
               )
             ORDER BY source_id, group_index",
            date,
        )
    }

    fn count_groups(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM shipment_groups", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
