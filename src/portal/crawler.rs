//! Paginated enumeration of today's shipments
//!
//! Listing pages are ordered newest first. Enumeration walks pages from 1
//! until it hits an empty page, a short page (fewer rows than a full page),
//! a later page without any of today's rows, or a failed request.

use crate::portal::error::CrawlError;
use crate::portal::extract::Extractor;
use crate::portal::session::Session;
use crate::shipment::timestamp::format_date;
use crate::shipment::Shipment;
use chrono::NaiveDate;
use std::time::Duration;
use url::Url;

/// Paging limits for one source
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Rows on a full page; fewer rows marks the last page
    pub page_size: usize,

    /// Pause between two page requests
    pub page_delay: Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &crate::config::CollectorConfig) -> Self {
        Self {
            page_size: config.page_size as usize,
            page_delay: Duration::from_millis(config.page_delay_ms),
        }
    }
}

/// What enumeration collected
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Today's shipments with a valid creation time
    pub shipments: Vec<Shipment>,

    /// Pages fetched successfully
    pub pages: u32,

    /// Today's rows dropped because their creation time did not parse
    pub unparseable: usize,

    /// True when a later page failed and enumeration stopped early
    pub partial: bool,
}

/// URL of a listing page; page 1 is the listing itself
pub fn page_url(listing_url: &Url, page: u32) -> Url {
    if page <= 1 {
        return listing_url.clone();
    }
    listing_url
        .join(&format!("page/{}/order_by/createdAt/desc/", page))
        .unwrap_or_else(|_| listing_url.clone())
}

/// Collects today's shipments from a source
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Everything collected, possibly partial
/// * `Err(CrawlError)` - The first page could not be fetched
pub async fn enumerate(
    session: &Session,
    extractor: &dyn Extractor,
    settings: &CrawlSettings,
    today: NaiveDate,
) -> Result<CrawlOutcome, CrawlError> {
    let source = session.source_id();
    let today_prefix = format_date(&today);
    let mut outcome = CrawlOutcome::default();
    let mut page: u32 = 1;

    loop {
        let url = page_url(session.listing_url(), page);
        tracing::debug!("[{}] Fetching listing page {}: {}", source, page, url);

        let html = match session.fetch(&url).await {
            Ok(html) => html,
            Err(e) if page == 1 => return Err(CrawlError::FirstPage(e)),
            Err(e) => {
                tracing::warn!(
                    "[{}] Listing page {} failed, keeping {} shipments: {}",
                    source,
                    page,
                    outcome.shipments.len(),
                    e
                );
                outcome.partial = true;
                break;
            }
        };
        outcome.pages += 1;

        let rows = extractor.listing_rows(&html);
        if rows.is_empty() {
            break;
        }
        let row_count = rows.len();

        let mut todays_rows = 0;
        for row in rows {
            if !row.created_at.trim().starts_with(&today_prefix) {
                continue;
            }

            match Shipment::from_row(row, session.base_url()) {
                Ok(shipment) => {
                    outcome.shipments.push(shipment);
                    todays_rows += 1;
                }
                Err(e) => {
                    tracing::warn!("[{}] Dropping row on page {}: {}", source, page, e);
                    outcome.unparseable += 1;
                }
            }
        }

        tracing::debug!(
            "[{}] Page {}: {} rows, {} from today",
            source,
            page,
            row_count,
            todays_rows
        );

        if todays_rows == 0 && page > 1 {
            break;
        }
        if row_count < settings.page_size {
            break;
        }

        page += 1;
        tokio::time::sleep(settings.page_delay).await;
    }

    tracing::info!(
        "[{}] Enumerated {} shipments over {} pages",
        source,
        outcome.shipments.len(),
        outcome.pages
    );

    Ok(outcome)
}
