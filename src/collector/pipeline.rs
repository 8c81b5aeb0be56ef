//! The per-source pipeline
//!
//! login → enumerate today's listing → enrich from detail pages → group →
//! aggregate → render and persist. Any stage before enrichment can end the
//! source with a [`SourceError`]; everything after it is infallible apart
//! from persistence, which only logs.

use crate::batch::{group_shipments, GroupSummary};
use crate::config::{Config, SourceEntry};
use crate::output::{build_report_unit, render_source_report, ReportUnit};
use crate::portal::{
    authenticate, build_http_client, enrich, enumerate, CrawlSettings, Extractor, NoDataError,
    SourceError,
};
use crate::storage::{GroupRecord, Storage};
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex};

/// Storage shared by every source task of a run
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Everything one source task needs, cheap to clone per task
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Arc<Config>,
    pub extractor: Arc<dyn Extractor>,
    pub store: SharedStorage,

    /// Wall-clock time of the run; fixes "today" and open unload durations
    pub now: NaiveDateTime,
}

/// A successfully processed source
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source_id: String,

    /// Message delivered for this source
    pub text: String,

    /// One unit per group, in report order
    pub units: Vec<ReportUnit>,
}

fn persist(store: &SharedStorage, record: &GroupRecord) {
    let result = match store.lock() {
        Ok(mut storage) => storage.save_group(record),
        Err(_) => {
            tracing::error!("Storage lock poisoned, group {} not saved", record.report_id);
            return;
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "[{}] Failed to save group {}: {}",
            record.source_id,
            record.group_index,
            e
        );
    }
}

/// Runs the whole pipeline for one source
pub async fn process_source(
    ctx: &PipelineContext,
    source: &SourceEntry,
) -> Result<SourceReport, SourceError> {
    let config = ctx.config.as_ref();
    let today = ctx.now.date();

    let client = build_http_client(config)?;
    let session = authenticate(client, config, source, ctx.extractor.as_ref()).await?;

    let settings = CrawlSettings::from_config(&config.collector);
    let crawl = enumerate(&session, ctx.extractor.as_ref(), &settings, today).await?;

    if crawl.shipments.is_empty() {
        return Err(if crawl.unparseable > 0 {
            NoDataError::NoValidTimestamps
        } else {
            NoDataError::NoShipmentsToday
        }
        .into());
    }

    let (shipments, _) = enrich(
        &session,
        Arc::clone(&ctx.extractor),
        crawl.shipments,
        config.collector.max_concurrent_details as usize,
    )
    .await;

    let groups = group_shipments(shipments);
    tracing::info!("[{}] {} groups", source.id, groups.len());

    let mut units = Vec::with_capacity(groups.len());
    for (position, group) in groups.iter().enumerate() {
        let index = position as u32 + 1;
        let summary = GroupSummary::compute(group, ctx.now);
        let unit = build_report_unit(&source.id, index, today, summary, ctx.now);

        persist(&ctx.store, &unit.record);
        units.push(unit);
    }

    Ok(SourceReport {
        source_id: source.id.clone(),
        text: render_source_report(&source.id, &units),
        units,
    })
}
