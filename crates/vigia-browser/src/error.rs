use std::time::Duration;
use thiserror::Error;
use vigia_core::Site;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("chromium error: {0}")]
    Chromium(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("invalid storage state: {0}")]
    InvalidStorageState(String),

    #[error("no rate limit registered for {site}")]
    UnknownSite { site: Site },

    #[error("rate limit for {site} not available after waiting {waited:?}")]
    RateLimitTimeout { site: Site, waited: Duration },

    #[error("rate limit wait for {site} cancelled")]
    Cancelled { site: Site },
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Chromium(err.to_string())
    }
}
