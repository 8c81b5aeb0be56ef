//! Detail page enrichment
//!
//! Each shipment's detail page is fetched on its own task. A per-source
//! semaphore bounds how many run at once; all tasks share the source's
//! session. A failed fetch leaves that shipment's counts at zero.

use crate::portal::error::DetailFetchError;
use crate::portal::extract::Extractor;
use crate::portal::session::Session;
use crate::shipment::{DetailMetrics, Shipment};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Counters for one enrichment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Detail pages read successfully
    pub fetched: usize,

    /// Detail fetches that failed; counts defaulted to zero
    pub failed: usize,

    /// Shipments without a detail page
    pub skipped: usize,
}

/// Fetches and parses one detail page
pub async fn fetch_detail(
    session: &Session,
    extractor: &dyn Extractor,
    url: &Url,
) -> Result<DetailMetrics, DetailFetchError> {
    let html = session.fetch(url).await?;
    extractor
        .detail_metrics(&html)
        .ok_or(DetailFetchError::Malformed)
}

/// Fills in detail counts for every shipment
///
/// Runs at most `max_concurrent` fetches at once. Every shipment is returned,
/// in input order, whether or not its fetch succeeded.
pub async fn enrich(
    session: &Session,
    extractor: Arc<dyn Extractor>,
    mut shipments: Vec<Shipment>,
    max_concurrent: usize,
) -> (Vec<Shipment>, EnrichStats) {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut stats = EnrichStats::default();

    // One slot per shipment, merged once every task has finished
    let handles: Vec<_> = shipments
        .iter()
        .map(|shipment| {
            let url = shipment.detail_url.clone()?;
            let session = session.clone();
            let extractor = Arc::clone(&extractor);
            let semaphore = Arc::clone(&semaphore);

            Some(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| DetailFetchError::Task(e.to_string()))?;
                fetch_detail(&session, extractor.as_ref(), &url).await
            }))
        })
        .collect();

    for (shipment, handle) in shipments.iter_mut().zip(handles) {
        let Some(handle) = handle else {
            stats.skipped += 1;
            continue;
        };

        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(DetailFetchError::Task(e.to_string())),
        };

        match result {
            Ok(metrics) => {
                tracing::debug!(
                    "[{}] Shipment {}: sent={} received={} excess={}",
                    session.source_id(),
                    shipment.id,
                    metrics.sent,
                    metrics.received,
                    metrics.excess
                );
                shipment.metrics = metrics;
                stats.fetched += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Detail fetch for shipment {} failed: {}",
                    session.source_id(),
                    shipment.id,
                    e
                );
                shipment.metrics = DetailMetrics::default();
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        "[{}] Details: {} fetched, {} failed, {} without page",
        session.source_id(),
        stats.fetched,
        stats.failed,
        stats.skipped
    );

    (shipments, stats)
}
