//! Dock-Tally: inbound shipment collector for pickup-point portals
//!
//! This crate logs into a set of independent pickup-point portals, collects
//! today's inbound shipments, enriches them with per-shipment counts and
//! condenses them into unloading batches with aggregated totals, a derived
//! status and an unload duration.

pub mod batch;
pub mod collector;
pub mod config;
pub mod output;
pub mod portal;
pub mod shipment;
pub mod storage;

use thiserror::Error;

/// Main error type for Dock-Tally operations
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] output::NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Dock-Tally operations
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use batch::{group_shipments, Group, GroupStatus, GroupSummary, UnloadDuration};
pub use collector::{Collector, SourceOutcome};
pub use config::Config;
pub use shipment::{DetailMetrics, Shipment, ShipmentStatus};
