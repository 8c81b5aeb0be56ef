//! Statistics from the collection database
//!
//! This module provides functionality for extracting and displaying
//! run and group statistics from the storage layer.

use crate::batch::GroupStatus;
use crate::storage::{GroupRecord, RunRecord, Storage};
use crate::CollectorError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Per-source totals for one delivery date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTotals {
    pub groups: u32,
    pub boxes: u64,
    pub sent: u64,
    pub received: u64,
    pub excess: u64,

    /// Groups still pending or being unloaded
    pub open_groups: u32,
}

/// Collection statistics summary
#[derive(Debug, Clone)]
pub struct CollectionStatistics {
    pub date: NaiveDate,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Group rows stored over all dates
    pub total_groups: u64,

    /// Totals for `date` from each source's latest run, keyed by source id
    pub by_source: BTreeMap<String, SourceTotals>,
}

/// Folds the groups of one date into per-source totals
pub fn totals_by_source(groups: &[GroupRecord]) -> BTreeMap<String, SourceTotals> {
    let mut totals: BTreeMap<String, SourceTotals> = BTreeMap::new();

    for group in groups {
        let entry = totals.entry(group.source_id.clone()).or_default();
        entry.groups += 1;
        entry.boxes += u64::from(group.boxes_count);
        entry.sent += group.sent;
        entry.received += group.received;
        entry.excess += group.excess;
        if group.status != GroupStatus::Closed {
            entry.open_groups += 1;
        }
    }

    totals
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `date` - Delivery date to summarize
///
/// # Returns
///
/// * `Ok(CollectionStatistics)` - Successfully loaded statistics
/// * `Err(CollectorError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    date: NaiveDate,
) -> Result<CollectionStatistics, CollectorError> {
    let latest_run = storage.latest_run()?;
    let total_groups = storage.count_groups()?;
    let groups = storage.latest_groups_for_date(date)?;

    Ok(CollectionStatistics {
        date,
        latest_run,
        total_groups,
        by_source: totals_by_source(&groups),
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CollectionStatistics) {
    println!("=== Collection Statistics ===\n");

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run:");
            println!("  ID: {}", run.id);
            println!("  Started: {}", run.started_at);
            println!(
                "  Finished: {}",
                run.finished_at.as_deref().unwrap_or("still running")
            );
            println!("  Status: {}", run.status.to_db_string());
            println!(
                "  Sources: {} ok, {} failed",
                run.sources_ok, run.sources_failed
            );
        }
        None => println!("No runs recorded yet"),
    }
    println!();

    println!("Stored groups: {}", stats.total_groups);
    println!();

    println!("Groups for {}:", stats.date.format("%Y-%m-%d"));
    if stats.by_source.is_empty() {
        println!("  (none)");
        return;
    }

    for (source, totals) in &stats.by_source {
        println!(
            "  {}: {} groups ({} open), {} boxes, sent {}, received {}, excess {}",
            source,
            totals.groups,
            totals.open_groups,
            totals.boxes,
            totals.sent,
            totals.received,
            totals.excess
        );
    }
}
