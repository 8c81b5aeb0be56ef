//! Group aggregation
//!
//! Reduces a [`Group`] to the figures a report needs: arrival window, unload
//! start and close, summed counts, a status for the whole batch and how long
//! unloading took (or has been taking).

use crate::batch::Group;
use chrono::NaiveDateTime;
use std::fmt;

/// Status of a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    Pending,
    InProgress,
    Closed,
}

impl GroupStatus {
    /// Derives the batch status from its members
    ///
    /// Any member in progress makes the batch in progress. Otherwise the batch
    /// is pending only when every member is pending, and closed in every other
    /// case, including a mix of pending and closed members.
    pub fn derive(group: &Group) -> Self {
        let members = group.members();
        if members.iter().any(|s| s.status.is_in_progress()) {
            Self::InProgress
        } else if members.iter().all(|s| s.status.is_pending()) {
            Self::Pending
        } else {
            Self::Closed
        }
    }

    /// Converts the status to its storage representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    /// Parses a status from its storage representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Report label: storage form with only the first letter upper-cased
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In_progress",
            Self::Closed => "Closed",
        }
    }

    /// Parses a report label back into a status
    pub fn from_label(label: &str) -> Option<Self> {
        Self::from_db_string(&label.trim().to_lowercase())
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unload duration of a batch in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadDuration {
    /// Whole seconds, fractional part truncated
    pub seconds: i64,

    /// Set only for a closed batch with both a start and a close time
    pub is_final: bool,
}

impl UnloadDuration {
    pub fn zero() -> Self {
        Self {
            seconds: 0,
            is_final: false,
        }
    }

    fn between(start: NaiveDateTime, end: NaiveDateTime, is_final: bool) -> Self {
        Self {
            seconds: (end - start).num_seconds(),
            is_final,
        }
    }

    /// Seconds to persist: the final duration, or 0 while still open
    pub fn persisted_seconds(&self) -> i64 {
        if self.is_final {
            self.seconds
        } else {
            0
        }
    }

    /// Formats as `H:MM:SS` with unbounded hours
    pub fn to_text(&self) -> String {
        let sign = if self.seconds < 0 { "-" } else { "" };
        let total = self.seconds.unsigned_abs();
        format!(
            "{}{}:{:02}:{:02}",
            sign,
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }

    /// Parses `H:MM:SS` text produced by [`UnloadDuration::to_text`]
    pub fn parse_seconds(text: &str) -> Option<i64> {
        let text = text.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut parts = body.split(':');
        let hours: i64 = parts.next()?.parse().ok()?;
        let minutes: i64 = parts.next()?.parse().ok()?;
        let seconds: i64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }

        let total = hours * 3600 + minutes * 60 + seconds;
        Some(if negative { -total } else { total })
    }
}

impl fmt::Display for UnloadDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Derived figures of one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub first_created: NaiveDateTime,
    pub last_created: NaiveDateTime,

    /// Earliest unload start among members that have one
    pub unload_started_at: Option<NaiveDateTime>,

    /// Latest close time among members; only set for a closed batch
    pub closed_at: Option<NaiveDateTime>,

    pub status: GroupStatus,
    pub sent: u64,
    pub received: u64,
    pub excess: u64,

    /// Number of shipments in the batch
    pub count: usize,

    pub duration: UnloadDuration,
}

impl GroupSummary {
    /// Aggregates a group
    ///
    /// `now` is the wall-clock time used for batches that are still being
    /// unloaded; the result depends on nothing else.
    pub fn compute(group: &Group, now: NaiveDateTime) -> Self {
        let members = group.members();
        let status = GroupStatus::derive(group);

        let unload_started_at = members.iter().filter_map(|s| s.unload_started_at).min();

        let closed_at = match status {
            GroupStatus::Closed => members.iter().filter_map(|s| s.closed_at).max(),
            _ => None,
        };

        let duration = match (status, unload_started_at, closed_at) {
            (GroupStatus::Closed, Some(start), Some(close)) => {
                UnloadDuration::between(start, close, true)
            }
            (_, Some(start), _) => UnloadDuration::between(start, now, false),
            _ => UnloadDuration::zero(),
        };

        Self {
            first_created: group.first_created(),
            last_created: group.last_created(),
            unload_started_at,
            closed_at,
            status,
            sent: members.iter().map(|s| s.metrics.sent).sum(),
            received: members.iter().map(|s| s.metrics.received).sum(),
            excess: members.iter().map(|s| s.metrics.excess).sum(),
            count: members.len(),
            duration,
        }
    }
}
