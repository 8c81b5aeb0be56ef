//! Shipment status definitions
//!
//! Portals report the lifecycle of an inbound shipment as a lower-case status
//! cell. Unrecognised values are kept verbatim so they still reach grouping.

use std::fmt;

/// Lifecycle status of a single shipment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShipmentStatus {
    /// Shipment arrived but unloading has not started
    Pending,

    /// Shipment is being unloaded
    InProgress,

    /// Unloading finished
    Closed,

    /// Any other status text the portal reports
    Other(String),
}

impl ShipmentStatus {
    /// Parses a status cell, case-insensitively
    pub fn parse(text: &str) -> Self {
        let lowered = text.trim().to_lowercase();
        match lowered.as_str() {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "closed" => Self::Closed,
            _ => Self::Other(lowered),
        }
    }

    /// Returns the lower-case status text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
            Self::Other(text) => text,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
