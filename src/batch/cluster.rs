//! Arrival-time clustering
//!
//! Shipments created before [`NIGHT_END_HOUR`] arrive overnight and are
//! unloaded as one batch. Daytime shipments are split into runs wherever two
//! consecutive arrivals are more than [`DAY_GAP_SECS`] apart.

use crate::batch::Group;
use crate::shipment::Shipment;
use chrono::{Duration, Timelike};

/// Shipments created before this hour belong to the night batch
pub const NIGHT_END_HOUR: u32 = 8;

/// Largest gap (seconds) between consecutive daytime arrivals within one batch
pub const DAY_GAP_SECS: i64 = 3600;

/// Clusters one source's shipments into groups
///
/// Every shipment ends up in exactly one non-empty group. Groups are returned
/// most recent first, ordered by their latest creation time.
pub fn group_shipments(shipments: Vec<Shipment>) -> Vec<Group> {
    let (night, mut day): (Vec<Shipment>, Vec<Shipment>) = shipments
        .into_iter()
        .partition(|s| s.created_at.hour() < NIGHT_END_HOUR);

    let mut groups = Vec::new();

    if let Some(group) = Group::new(night) {
        groups.push(group);
    }

    day.sort_by_key(|s| s.created_at);

    let max_gap = Duration::seconds(DAY_GAP_SECS);
    let mut current: Vec<Shipment> = Vec::new();
    for shipment in day {
        let starts_new_run = current
            .last()
            .map(|prev| shipment.created_at - prev.created_at > max_gap)
            .unwrap_or(false);

        if starts_new_run {
            groups.extend(Group::new(std::mem::take(&mut current)));
        }
        current.push(shipment);
    }
    groups.extend(Group::new(current));

    groups.sort_by(|a, b| b.last_created().cmp(&a.last_created()));

    tracing::trace!("Clustered shipments into {} groups", groups.len());
    groups
}
