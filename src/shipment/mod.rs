//! Shipment records
//!
//! This module defines the raw rows an extractor pulls from a listing page and
//! the validated [`Shipment`] the rest of the pipeline works with.
//!
//! # Components
//!
//! - `ListingRow`: raw cell text of one listing row
//! - `Shipment`: a parsed row plus the counts from its detail page
//! - `ShipmentStatus`: lifecycle status of a shipment

mod status;
pub mod timestamp;

pub use status::ShipmentStatus;
pub use timestamp::{parse_optional_timestamp, parse_timestamp, ParseError};

use crate::portal::portal_url;
use chrono::NaiveDateTime;
use url::Url;

/// Identifier used when a row carries no shipment link
pub const UNKNOWN_ID: &str = "—";

/// Raw text of one row on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRow {
    /// Shipment identifier (link text of the external id cell)
    pub id: Option<String>,

    /// Creation time text
    pub created_at: String,

    /// Unload start time text (`-` when not started)
    pub unload_started_at: String,

    /// Close time text, present only when the row shows one
    pub closed_at: Option<String>,

    /// Status cell text
    pub status: String,

    /// Detail page href, relative or absolute
    pub detail_href: Option<String>,
}

/// Per-shipment counts read from the detail page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailMetrics {
    pub sent: u64,
    pub received: u64,
    pub excess: u64,
}

/// One inbound shipment of one source
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    /// Source-local identifier, [`UNKNOWN_ID`] when the row had none
    pub id: String,

    /// Parsed creation time
    pub created_at: NaiveDateTime,

    /// Creation time as shown on the portal
    pub created_text: String,

    /// When unloading started, if it has
    pub unload_started_at: Option<NaiveDateTime>,

    /// When the shipment was closed, if it was
    pub closed_at: Option<NaiveDateTime>,

    pub status: ShipmentStatus,

    /// Absolute detail page URL
    pub detail_url: Option<Url>,

    /// Counts from the detail page; zero until enriched or when the fetch failed
    pub metrics: DetailMetrics,
}

impl Shipment {
    /// Builds a shipment from a listing row
    ///
    /// The close time is only read for closed rows. Optional timestamps that
    /// do not parse are treated as absent; a creation time that does not
    /// parse rejects the row.
    pub fn from_row(row: ListingRow, base_url: &Url) -> Result<Self, ParseError> {
        let created_at = parse_timestamp(&row.created_at)?;
        let status = ShipmentStatus::parse(&row.status);

        let closed_at = if status.is_closed() {
            row.closed_at.as_deref().and_then(parse_optional_timestamp)
        } else {
            None
        };

        let detail_url = row.detail_href.as_deref().and_then(|href| {
            portal_url(base_url, href)
                .map_err(|e| tracing::debug!("Bad detail href '{}': {}", href, e))
                .ok()
        });

        Ok(Self {
            id: row
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| UNKNOWN_ID.to_string()),
            created_at,
            created_text: row.created_at.trim().to_string(),
            unload_started_at: parse_optional_timestamp(&row.unload_started_at),
            closed_at,
            status,
            detail_url,
            metrics: DetailMetrics::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://pvs.example").unwrap()
    }

    fn row() -> ListingRow {
        ListingRow {
            id: Some("SHP-1".to_string()),
            created_at: "2024-05-10 09:00:00".to_string(),
            unload_started_at: "2024-05-10 09:05:00".to_string(),
            closed_at: Some("2024-05-10 09:30:00".to_string()),
            status: "Closed".to_string(),
            detail_href: Some("/shipments/view/1".to_string()),
        }
    }

    #[test]
    fn test_from_row_closed() {
        let shipment = Shipment::from_row(row(), &base()).unwrap();
        assert_eq!(shipment.id, "SHP-1");
        assert_eq!(shipment.status, ShipmentStatus::Closed);
        assert!(shipment.unload_started_at.is_some());
        assert!(shipment.closed_at.is_some());
        assert_eq!(
            shipment.detail_url.unwrap().as_str(),
            "https://pvs.example/shipments/view/1"
        );
        assert_eq!(shipment.metrics, DetailMetrics::default());
    }

    #[test]
    fn test_detail_url_under_base_path() {
        let base = Url::parse("https://pvs.example/pvs1").unwrap();
        let shipment = Shipment::from_row(row(), &base).unwrap();
        assert_eq!(
            shipment.detail_url.unwrap().as_str(),
            "https://pvs.example/pvs1/shipments/view/1"
        );
    }

    #[test]
    fn test_close_time_ignored_unless_closed() {
        let mut r = row();
        r.status = "in_progress".to_string();
        let shipment = Shipment::from_row(r, &base()).unwrap();
        assert_eq!(shipment.closed_at, None);
    }

    #[test]
    fn test_missing_id_uses_placeholder() {
        let mut r = row();
        r.id = None;
        r.detail_href = None;
        let shipment = Shipment::from_row(r, &base()).unwrap();
        assert_eq!(shipment.id, UNKNOWN_ID);
        assert_eq!(shipment.detail_url, None);
    }

    #[test]
    fn test_unparseable_creation_time_is_rejected() {
        let mut r = row();
        r.created_at = "2024-05-10 9h".to_string();
        assert!(matches!(
            Shipment::from_row(r, &base()),
            Err(ParseError::Timestamp(_))
        ));
    }

    #[test]
    fn test_unstarted_shipment() {
        let mut r = row();
        r.status = "pending".to_string();
        r.unload_started_at = "-".to_string();
        let shipment = Shipment::from_row(r, &base()).unwrap();
        assert_eq!(shipment.unload_started_at, None);
        assert!(shipment.status.is_pending());
    }
}
