//! Portal timestamp handling
//!
//! Portals exchange timestamps as `YYYY-MM-DD HH:MM:SS` in their local time.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Textual timestamp pattern used by every portal
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date prefix of [`TIMESTAMP_FORMAT`]
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder the portal renders for a missing timestamp
pub const MISSING: &str = "-";

/// A timestamp cell that could not be read
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),
}

/// Parses a required portal timestamp
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| ParseError::Timestamp(text.trim().to_string()))
}

/// Parses an optional portal timestamp
///
/// Empty cells and the `-` placeholder mean the event has not happened.
/// Malformed text is treated the same way.
pub fn parse_optional_timestamp(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == MISSING {
        return None;
    }
    match parse_timestamp(trimmed) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::debug!("Ignoring optional timestamp: {}", e);
            None
        }
    }
}

/// Formats a timestamp in the portal pattern
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Formats a date as `YYYY-MM-DD`
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
