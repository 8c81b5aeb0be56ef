//! Portal login and the authenticated session

use crate::config::{Config, SourceEntry};
use crate::portal::client::{fetch_page, portal_url};
use crate::portal::error::{AuthError, PageError};
use crate::portal::extract::Extractor;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// An authenticated connection to one portal
///
/// Cloning is cheap and every clone shares the same cookie store, so detail
/// fetches can run on several tasks at once.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    source_id: String,
    base_url: Url,
    listing_url: Url,
}

impl Session {
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// First page of today's incoming shipments
    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Fetches a page with the session cookie and the default deadline
    pub async fn fetch(&self, url: &Url) -> Result<String, PageError> {
        fetch_page(&self.client, url, None).await
    }
}

/// Logs into a portal
///
/// 1. GET the login page (login deadline), non-200 → `Unreachable`
/// 2. Read the redirect token, defaulting to the listing path
/// 3. POST `identity`/`credential`/`redirect`, following redirects
/// 4. A response that still shows the login form → `Rejected`
pub async fn authenticate(
    client: Client,
    config: &Config,
    source: &SourceEntry,
    extractor: &dyn Extractor,
) -> Result<Session, AuthError> {
    let base_url =
        Url::parse(&source.base_url).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
    let login_url = portal_url(&base_url, &config.portal.login_path)
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
    let listing_url = portal_url(&base_url, &config.portal.listing_path)
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
    let credentials = config
        .credentials_for(source)
        .ok_or(AuthError::MissingCredentials)?;
    let login_timeout = Duration::from_secs(config.collector.login_timeout_secs);

    tracing::debug!("[{}] Fetching login page {}", source.id, login_url);
    let login_page = fetch_page(&client, &login_url, Some(login_timeout))
        .await
        .map_err(AuthError::Unreachable)?;

    let redirect = extractor
        .login_redirect(&login_page)
        .unwrap_or_else(|| config.portal.listing_path.clone());

    let form = [
        ("identity", credentials.username.as_str()),
        ("credential", credentials.password.as_str()),
        ("redirect", redirect.as_str()),
    ];

    let response = client
        .post(login_url.clone())
        .form(&form)
        .timeout(login_timeout)
        .send()
        .await
        .map_err(|e| AuthError::Unreachable(e.into()))?;
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::Unreachable(e.into()))?;

    if extractor.is_login_form(&body) {
        tracing::warn!("[{}] Login rejected", source.id);
        return Err(AuthError::Rejected);
    }

    tracing::info!("[{}] Logged in", source.id);

    Ok(Session {
        client,
        source_id: source.id.clone(),
        base_url,
        listing_url,
    })
}

#[cfg(test)]
impl Session {
    /// Session without a login round-trip, for tests against mock portals
    pub(crate) fn for_tests(client: Client, source_id: &str, base_url: &str) -> Self {
        let base_url = Url::parse(base_url).unwrap();
        let listing_url = portal_url(&base_url, "/shipments/incoming/").unwrap();
        Self {
            client,
            source_id: source_id.to_string(),
            base_url,
            listing_url,
        }
    }
}
