//! Browser side of a crawl job.
//!
//! Paces requests with per-site token buckets and opens headless Chromium
//! sessions shaped by each site's anti-detection posture.

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod rate_limiter;
pub mod session;

pub use engine::{ChromiumLauncher, ChromiumSession};
pub use error::{BrowserError, Result};
pub use fingerprint::Fingerprint;
pub use rate_limiter::RateLimiter;
pub use session::{BrowserLauncher, BrowsingSession, LaunchRequest, StorageCookie};
