//! HTTP client setup and page fetching
//!
//! Every source gets its own client so its session cookie never leaks into
//! another portal. The client is cheap to clone and is shared by all detail
//! fetches of that source.

use crate::config::Config;
use crate::portal::error::PageError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds the HTTP client for one source
///
/// The client keeps a cookie store for the portal session, follows login
/// redirects and applies the listing/detail deadline to every request.
///
/// # Example
///
/// ```no_run
/// use dock_tally::config::load_config;
/// use dock_tally::portal::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    // Format: Name/Version
    let user_agent = format!("{}/{}", config.user_agent.name, config.user_agent.version);

    Client::builder()
        .user_agent(user_agent)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.collector.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.collector.request_timeout_secs))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(config.collector.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resolves a portal path under the source's base URL
///
/// The path is appended to the base path, so a base of
/// `https://host/pvs1` puts `/user/login` at `https://host/pvs1/user/login`.
/// Absolute URLs pass through unchanged.
pub fn portal_url(base_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    if let Ok(absolute) = Url::parse(path) {
        return Ok(absolute);
    }

    let base = base_url.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{}/{}", base, path))
}

/// Fetches a page body, failing on anything but HTTP 200
///
/// `timeout` overrides the client-wide deadline for this request.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    timeout: Option<Duration>,
) -> Result<String, PageError> {
    let mut request = client.get(url.clone());
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(PageError::Status(status.as_u16()));
    }

    Ok(response.text().await?)
}
