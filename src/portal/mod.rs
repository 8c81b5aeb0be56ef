//! Portal access
//!
//! Everything that talks to a pickup-point portal lives here: the per-source
//! HTTP client, login, listing enumeration and detail enrichment. Markup
//! knowledge is confined to the [`Extractor`] implementation.
//!
//! # Components
//!
//! - `client`: HTTP client construction and page fetching
//! - `session`: login and the authenticated [`Session`]
//! - `crawler`: paginated listing enumeration
//! - `details`: bounded-concurrency detail fetching
//! - `extract`: the [`Extractor`] seam and its HTML implementation

mod client;
mod crawler;
mod details;
mod error;
mod extract;
mod session;

pub use client::{build_http_client, fetch_page, portal_url};
pub use crawler::{enumerate, page_url, CrawlOutcome, CrawlSettings};
pub use details::{enrich, fetch_detail, EnrichStats};
pub use error::{AuthError, CrawlError, DetailFetchError, NoDataError, PageError, SourceError};
pub use extract::{Extractor, HtmlExtractor};
pub use session::{authenticate, Session};
