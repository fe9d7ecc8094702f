use crate::error::{BrowserError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use vigia_core::Site;
use vigia_sites::{AntiDetection, SiteConfig};

/// One cookie of a browser storage state.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    /// Seconds since the epoch; negative or absent means a session cookie
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn root_path() -> String {
    "/".to_string()
}

impl fmt::Debug for StorageCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCookie")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Read the cookies of a `{cookies, origins}` storage state.
pub fn cookies_from_storage_state(state: &Value) -> Result<Vec<StorageCookie>> {
    let cookies = state
        .get("cookies")
        .and_then(Value::as_array)
        .ok_or_else(|| BrowserError::InvalidStorageState("missing cookies array".to_string()))?;

    cookies
        .iter()
        .enumerate()
        .map(|(index, cookie)| {
            StorageCookie::deserialize(cookie).map_err(|e| {
                BrowserError::InvalidStorageState(format!("cookie #{index}: {e}"))
            })
        })
        .collect()
}

/// Everything needed to open a browsing session for one crawl job.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub site: Site,
    pub anti_detection: AntiDetection,
    pub navigation_timeout: Duration,
    /// Empty for anonymous sessions
    pub cookies: Vec<StorageCookie>,
}

impl LaunchRequest {
    /// Anonymous request shaped by the site's configuration.
    pub fn anonymous(config: &SiteConfig) -> Self {
        Self {
            site: config.site,
            anti_detection: config.anti_detection,
            navigation_timeout: config.timeouts.navigation_timeout(),
            cookies: Vec::new(),
        }
    }

    /// Request carrying the cookies of a storage state.
    pub fn with_storage_state(config: &SiteConfig, state: &Value) -> Result<Self> {
        Ok(Self {
            cookies: cookies_from_storage_state(state)?,
            ..Self::anonymous(config)
        })
    }

    pub fn is_authenticated(&self) -> bool {
        !self.cookies.is_empty()
    }
}

/// A live browser tab owned by one crawl job.
#[async_trait::async_trait]
pub trait BrowsingSession: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Rendered HTML of the current page
    async fn content(&self) -> Result<String>;

    /// Visible text of the current page
    async fn visible_text(&self) -> Result<String>;

    /// Release the browser. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Opens browsing sessions.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, request: LaunchRequest) -> Result<Box<dyn BrowsingSession>>;
}

/// Helper to extract the host from a URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::Navigation(format!("Invalid URL: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::Navigation("No host in URL".to_string()))
        .map(ToString::to_string)
}
