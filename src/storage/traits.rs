//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{GroupRecord, RunRecord, RunStatus};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The collector only needs run bookkeeping and group upserts; reads exist
/// for the statistics view.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, started_at: NaiveDateTime) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records how a run ended
    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        finished_at: NaiveDateTime,
        sources_ok: u32,
        sources_failed: u32,
    ) -> StorageResult<()>;

    // ===== Groups =====

    /// Inserts a group, replacing any earlier row with the same report id
    fn save_group(&mut self, record: &GroupRecord) -> StorageResult<()>;

    /// Groups delivered on a date, ordered by source then group index
    fn groups_for_date(&self, date: NaiveDate) -> StorageResult<Vec<GroupRecord>>;

    /// Like [`Storage::groups_for_date`], but for each source only the rows
    /// written by its most recent run on that date
    fn latest_groups_for_date(&self, date: NaiveDate) -> StorageResult<Vec<GroupRecord>>;

    fn count_groups(&self) -> StorageResult<u64>;
}
