use serde::Deserialize;

/// Main configuration structure for Dock-Tally
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub collector: CollectorConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    pub output: OutputConfig,
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

impl Config {
    /// Returns the credentials a source logs in with
    ///
    /// Per-source credentials win over the global `[credentials]` section.
    pub fn credentials_for(&self, source: &SourceEntry) -> Option<Credentials> {
        match (&source.username, &source.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => self.credentials.clone(),
        }
    }
}

/// Collection behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Number of sources processed in parallel
    ///
    /// Set it to at least the number of sources so every portal starts at
    /// once; with fewer slots the remaining sources queue and a run takes
    /// longer. Validation logs a warning in that case.
    #[serde(rename = "max-concurrent-sources")]
    pub max_concurrent_sources: u32,

    /// Number of detail pages fetched in parallel within one source
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: u32,

    /// Rows per full listing page; a page with fewer rows is the last one
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Pause between listing pages of one source (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Deadline for listing and detail requests (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Deadline for login requests (seconds)
    #[serde(rename = "login-timeout-secs")]
    pub login_timeout_secs: u64,

    /// Accept self-signed portal certificates
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,
}

/// Portal URL layout
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Login form path
    #[serde(rename = "login-path", default = "default_login_path")]
    pub login_path: String,

    /// Incoming shipments listing path, also the default login redirect
    #[serde(rename = "listing-path", default = "default_listing_path")]
    pub listing_path: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            listing_path: default_listing_path(),
        }
    }
}

fn default_login_path() -> String {
    "/user/login".to_string()
}

fn default_listing_path() -> String {
    "/shipments/incoming/".to_string()
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the collector
    pub name: String,

    /// Version of the collector
    pub version: String,
}

/// Portal login credentials
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Telegram delivery configuration
#[derive(Clone, Deserialize)]
pub struct NotifyConfig {
    /// Bot token
    #[serde(rename = "telegram-token")]
    pub telegram_token: String,

    /// Chats that receive every report
    #[serde(rename = "chat-ids")]
    pub chat_ids: Vec<String>,

    /// Bot API base URL
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("telegram_token", &"***")
            .field("chat_ids", &self.chat_ids)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// One pickup-point portal
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Source identifier used in reports and storage
    pub id: String,

    /// Portal root URL (e.g., "https://pvs-site1.example")
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}
