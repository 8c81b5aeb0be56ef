//! Output module for reports, delivery and statistics
//!
//! This module handles:
//! - Rendering aggregated groups into per-source report text
//! - Delivering those reports (Telegram or stdout)
//! - Summarizing stored runs and groups

mod notify;
mod report;
pub mod stats;

pub use notify::{Notifier, NotifyError, StdoutNotifier, TelegramNotifier};
pub use report::{
    build_report_unit, parse_report_fields, render_group, render_source_report, report_id,
    RenderedFields, ReportUnit, RUN_STAMP_FORMAT,
};
pub use stats::{load_statistics, print_statistics, CollectionStatistics, SourceTotals};
