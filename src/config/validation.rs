use crate::config::types::{
    CollectorConfig, Config, NotifyConfig, PortalConfig, SourceEntry, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_portal_config(&config.portal)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sources(config)?;
    if let Some(notify) = &config.notify {
        validate_notify_config(notify)?;
    }
    Ok(())
}

/// Validates collector configuration
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sources < 1 || config.max_concurrent_sources > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sources must be between 1 and 100, got {}",
            config.max_concurrent_sources
        )));
    }

    if config.max_concurrent_details < 1 || config.max_concurrent_details > 50 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_details must be between 1 and 50, got {}",
            config.max_concurrent_details
        )));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.login_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "login_timeout_secs must be >= 1, got {}",
            config.login_timeout_secs
        )));
    }

    Ok(())
}

/// Validates portal paths
///
/// Listing pages are built relative to the listing path, so it must be a
/// directory-style path.
fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    if !config.login_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "login-path must start with '/', got '{}'",
            config.login_path
        )));
    }

    if !config.listing_path.starts_with('/') || !config.listing_path.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "listing-path must start and end with '/', got '{}'",
            config.listing_path
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the source list and the credentials each source resolves to
fn validate_sources(config: &Config) -> Result<(), ConfigError> {
    if config.sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let slots = config.collector.max_concurrent_sources as usize;
    if slots < config.sources.len() {
        tracing::warn!(
            "max-concurrent-sources is {} but {} sources are configured; \
             the rest wait for a free slot",
            slots,
            config.sources.len()
        );
    }

    let mut seen = HashSet::new();
    for source in &config.sources {
        validate_source(source)?;

        if !seen.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id '{}'",
                source.id
            )));
        }

        match config.credentials_for(source) {
            Some(creds) if !creds.username.is_empty() && !creds.password.is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has no usable credentials",
                    source.id
                )));
            }
        }
    }

    Ok(())
}

fn validate_source(source: &SourceEntry) -> Result<(), ConfigError> {
    if source.id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source id cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&source.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid base-url '{}' for source '{}': {}",
            source.base_url, source.id, e
        ))
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            source.base_url
        )));
    }

    // Portal paths are appended to the base URL
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' cannot carry a query or fragment",
            source.base_url
        )));
    }

    Ok(())
}

fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if config.telegram_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "telegram-token cannot be empty".to_string(),
        ));
    }

    if config.chat_ids.iter().all(|id| id.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "chat-ids must contain at least one chat".to_string(),
        ));
    }

    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-base: {}", e)))?;

    Ok(())
}
