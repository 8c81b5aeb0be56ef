//! Error types for talking to a portal
//!
//! Each stage of a source's pipeline has its own error so the orchestrator can
//! tell a fatal failure (login, first listing page, nothing to report) from
//! one it recovers from locally (a single detail page).

use thiserror::Error;

/// A single page request that did not produce a usable body
#[derive(Debug, Error)]
pub enum PageError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for PageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Login against a portal failed
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login page unreachable ({0})")]
    Unreachable(PageError),

    #[error("Login failed")]
    Rejected,

    #[error("Invalid portal URL: {0}")]
    InvalidUrl(String),

    #[error("No credentials configured")]
    MissingCredentials,
}

/// Listing enumeration failed before producing anything
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("First listing page unreachable ({0})")]
    FirstPage(PageError),
}

/// One shipment's detail page could not be read
#[derive(Debug, Error)]
pub enum DetailFetchError {
    #[error("detail page request failed: {0}")]
    Page(#[from] PageError),

    #[error("detail page has no metrics section")]
    Malformed,

    #[error("detail task failed: {0}")]
    Task(String),
}

/// A source had nothing to report for today
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NoDataError {
    #[error("No shipments found for today")]
    NoShipmentsToday,

    #[error("No valid shipment timestamps")]
    NoValidTimestamps,
}

/// Terminal failure of one source's pipeline
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    NoData(#[from] NoDataError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Unhandled error: {0}")]
    Task(String),
}
