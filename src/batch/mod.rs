//! Unloading batches
//!
//! This module condenses one source's shipments into batches:
//! - `cluster` splits shipments into groups by arrival time
//! - `aggregate` derives totals, status and unload duration for a group

mod aggregate;
mod cluster;

pub use aggregate::{GroupStatus, GroupSummary, UnloadDuration};
pub use cluster::{group_shipments, DAY_GAP_SECS, NIGHT_END_HOUR};

use crate::shipment::Shipment;
use chrono::NaiveDateTime;

/// A non-empty batch of shipments from one source, ordered by creation time
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    members: Vec<Shipment>,
}

impl Group {
    /// Creates a group, sorting members by creation time
    ///
    /// Returns `None` for an empty member list.
    pub fn new(mut members: Vec<Shipment>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }
        members.sort_by_key(|s| s.created_at);
        Some(Self { members })
    }

    pub fn members(&self) -> &[Shipment] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Creation time of the earliest member
    pub fn first_created(&self) -> NaiveDateTime {
        self.members[0].created_at
    }

    /// Creation time of the latest member
    pub fn last_created(&self) -> NaiveDateTime {
        self.members[self.members.len() - 1].created_at
    }
}
