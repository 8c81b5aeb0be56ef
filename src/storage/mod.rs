//! Storage module for persisting collection results
//!
//! This module handles all database operations for the collector, including:
//! - SQLite database initialization and schema management
//! - Run bookkeeping (start, finish, per-source outcome counts)
//! - Group records, one row per report unit, upserted by report id

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::batch::GroupStatus;

/// Persisted form of one aggregated group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    /// `GROUP_{run stamp}_{source}_{index}`, unique per run, source and group
    pub report_id: String,
    pub source_id: String,

    /// Day the group was delivered (`YYYY-MM-DD`)
    pub delivery_date: String,

    /// Earliest creation time in the group
    pub created_at: String,
    pub unload_started_at: Option<String>,
    pub closed_at: Option<String>,
    pub status: GroupStatus,
    pub sent: u64,
    pub received: u64,
    pub excess: u64,

    /// 1-based position in the source report
    pub group_index: u32,
    pub boxes_count: u32,

    /// Final unload duration, 0 while unloading is still open
    pub unload_duration_seconds: i64,

    /// Start time of the run that wrote the row (`YYYY-MM-DD HH:MM:SS`)
    pub run_stamp: String,
}

/// Represents a collection run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub sources_ok: u32,
    pub sources_failed: u32,
}

/// Status of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
