//! Collection orchestration
//!
//! This module contains the run-level logic:
//! - `pipeline`: everything that happens for a single source
//! - `coordinator`: running all sources concurrently and delivering results

mod coordinator;
mod pipeline;

pub use coordinator::{Collector, SourceOutcome};
pub use pipeline::{process_source, PipelineContext, SharedStorage, SourceReport};
