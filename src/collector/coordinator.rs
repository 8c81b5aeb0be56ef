//! Collector coordinator - runs every source and gathers the outcomes
//!
//! Each source runs on its own task. A semaphore sized by
//! `max-concurrent-sources` bounds how many are in flight; results come back
//! over a channel in completion order. A source that fails (or whose task
//! panics) produces an error outcome and never affects its siblings.

use crate::collector::pipeline::{process_source, PipelineContext, SharedStorage, SourceReport};
use crate::config::Config;
use crate::output::Notifier;
use crate::portal::{Extractor, HtmlExtractor, SourceError};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::CollectorError;
use chrono::{Local, NaiveDateTime};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;

/// Result of one source in a run
#[derive(Debug)]
pub struct SourceOutcome {
    pub source_id: String,
    pub result: Result<SourceReport, SourceError>,
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Message delivered for this source: its report, or `Error {source}: {error}`
    pub fn message(&self) -> String {
        match &self.result {
            Ok(report) => report.text.clone(),
            Err(e) => format!("Error {}: {}", self.source_id, e),
        }
    }
}

/// Main collector structure
pub struct Collector {
    config: Arc<Config>,
    config_hash: String,
    extractor: Arc<dyn Extractor>,
    store: SharedStorage,
}

impl Collector {
    pub fn new(
        config: Config,
        config_hash: String,
        extractor: Arc<dyn Extractor>,
        store: SharedStorage,
    ) -> Self {
        Self {
            config: Arc::new(config),
            config_hash,
            extractor,
            store,
        }
    }

    /// Creates a collector with the HTML extractor and the configured database
    ///
    /// # Returns
    ///
    /// * `Ok(Collector)` - Ready to run
    /// * `Err(CollectorError)` - The database could not be opened
    pub fn from_config(config: Config, config_hash: String) -> Result<Self, CollectorError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let store: SharedStorage = Arc::new(Mutex::new(storage));

        Ok(Self::new(
            config,
            config_hash,
            Arc::new(HtmlExtractor::new()),
            store,
        ))
    }

    pub fn store(&self) -> &SharedStorage {
        &self.store
    }

    /// Runs every source against the local wall clock
    pub async fn run(&self) -> Vec<SourceOutcome> {
        self.run_at(Local::now().naive_local()).await
    }

    /// Runs every source as if the current time were `now`
    ///
    /// Returns exactly one outcome per configured source, in completion order.
    pub async fn run_at(&self, now: NaiveDateTime) -> Vec<SourceOutcome> {
        let sources = &self.config.sources;
        tracing::info!("Collecting from {} sources", sources.len());

        let run_id = self.start_run(now);

        let ctx = PipelineContext {
            config: Arc::clone(&self.config),
            extractor: Arc::clone(&self.extractor),
            store: Arc::clone(&self.store),
            now,
        };
        let semaphore = Arc::new(Semaphore::new(
            self.config.collector.max_concurrent_sources.max(1) as usize,
        ));
        let (tx, mut rx) = mpsc::channel(sources.len().max(1));

        let handles: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(slot, source)| {
                let ctx = ctx.clone();
                let source = source.clone();
                let semaphore = Arc::clone(&semaphore);
                let tx = tx.clone();

                tokio::spawn(async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => process_source(&ctx, &source).await,
                        Err(e) => Err(SourceError::Task(e.to_string())),
                    };

                    match &result {
                        Ok(report) => tracing::info!(
                            "[{}] Done: {} groups",
                            source.id,
                            report.units.len()
                        ),
                        Err(e) => tracing::error!("[{}] {}", source.id, e),
                    }

                    // The receiver lives until every sender is gone
                    let _ = tx.send((slot, result)).await;
                })
            })
            .collect();
        drop(tx);

        let mut reported = vec![false; sources.len()];
        let mut outcomes = Vec::with_capacity(sources.len());
        while let Some((slot, result)) = rx.recv().await {
            reported[slot] = true;
            outcomes.push(SourceOutcome {
                source_id: sources[slot].id.clone(),
                result,
            });
        }

        // Tasks that never reported panicked or were cancelled
        for (slot, handle) in handles.into_iter().enumerate() {
            if reported[slot] {
                continue;
            }
            let reason = match handle.await {
                Ok(()) => "task ended without a result".to_string(),
                Err(e) => panic_reason(e),
            };
            tracing::error!("[{}] Unhandled error: {}", sources[slot].id, reason);
            outcomes.push(SourceOutcome {
                source_id: sources[slot].id.clone(),
                result: Err(SourceError::Task(reason)),
            });
        }

        let ok = outcomes.iter().filter(|o| o.is_ok()).count() as u32;
        let failed = outcomes.len() as u32 - ok;
        tracing::info!("Run finished: {} sources ok, {} failed", ok, failed);

        if let Some(run_id) = run_id {
            let status = if ok == 0 && failed > 0 {
                RunStatus::Failed
            } else {
                RunStatus::Completed
            };
            self.finish_run(run_id, status, ok, failed);
        }

        outcomes
    }

    /// Sends one message per outcome
    ///
    /// Returns how many messages were delivered. Delivery failures are logged.
    pub async fn deliver(&self, outcomes: &[SourceOutcome], notifier: &dyn Notifier) -> usize {
        let mut delivered = 0;
        for outcome in outcomes {
            match notifier.notify(&outcome.message()).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Delivery of {} via {} failed: {}",
                    outcome.source_id,
                    notifier.name(),
                    e
                ),
            }
        }
        delivered
    }

    fn start_run(&self, now: NaiveDateTime) -> Option<i64> {
        let result = match self.store.lock() {
            Ok(mut storage) => storage.create_run(&self.config_hash, now),
            Err(_) => {
                tracing::error!("Storage lock poisoned, run not recorded");
                return None;
            }
        };

        match result {
            Ok(run_id) => {
                tracing::info!("Starting run {}", run_id);
                Some(run_id)
            }
            Err(e) => {
                tracing::error!("Failed to record run start: {}", e);
                None
            }
        }
    }

    fn finish_run(&self, run_id: i64, status: RunStatus, ok: u32, failed: u32) {
        let finished_at = Local::now().naive_local();
        let result = match self.store.lock() {
            Ok(mut storage) => storage.complete_run(run_id, status, finished_at, ok, failed),
            Err(_) => {
                tracing::error!("Storage lock poisoned, run {} not closed", run_id);
                return;
            }
        };

        if let Err(e) = result {
            tracing::error!("Failed to record end of run {}: {}", run_id, e);
        }
    }
}

fn panic_reason(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
