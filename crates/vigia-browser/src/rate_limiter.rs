//! Per-site token buckets shared by every crawl job in the process.
//!
//! Each bucket holds up to `tokens_per_min` tokens, starts full and refills
//! continuously at `tokens_per_min / 60` tokens per second. Refill and take
//! happen under the bucket's own mutex, so concurrent acquirers never
//! overdraw and sites never contend with each other.

use crate::error::{BrowserError, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use vigia_core::Site;
use vigia_sites::SiteRegistry;

/// Shortest sleep between refill checks.
const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(tokens_per_min: u32, now: Instant) -> Self {
        let capacity = f64::from(tokens_per_min);
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: capacity / 60.0,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token, or report how long until one is available.
    fn try_take(&mut self, now: Instant) -> std::result::Result<(), Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_per_sec).max(MIN_WAIT))
        }
    }
}

/// Token-bucket limiter with one bucket per registered site.
///
/// The set of sites is fixed at construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: HashMap<Site, Mutex<Bucket>>,
}

impl RateLimiter {
    /// Build one full bucket per `(site, tokens_per_min)` pair.
    pub fn new(limits: impl IntoIterator<Item = (Site, u32)>) -> Self {
        let now = Instant::now();
        let buckets = limits
            .into_iter()
            .filter(|(_, tokens_per_min)| *tokens_per_min > 0)
            .map(|(site, tokens_per_min)| (site, Mutex::new(Bucket::full(tokens_per_min, now))))
            .collect();
        Self { buckets }
    }

    /// One bucket per site in the registry, sized by its configured rate.
    pub fn from_registry(registry: &SiteRegistry) -> Self {
        Self::new(
            registry
                .configs()
                .map(|config| (config.site, config.rate_limit.tokens_per_min)),
        )
    }

    /// Whether a bucket exists for the site.
    pub fn has_site(&self, site: Site) -> bool {
        self.buckets.contains_key(&site)
    }

    /// Wait for a token with no deadline.
    pub async fn acquire(&self, site: Site) -> Result<()> {
        self.acquire_inner(site, None, None).await
    }

    /// Wait for a token until `deadline`.
    ///
    /// Returns `RateLimitTimeout` once the deadline passes without a token.
    pub async fn acquire_until(&self, site: Site, deadline: Instant) -> Result<()> {
        self.acquire_inner(site, Some(deadline), None).await
    }

    /// Wait for a token until `deadline` or until `cancel` fires.
    ///
    /// Returns `Cancelled` when the token is cancelled first. A cancelled
    /// waiter never consumes a token.
    pub async fn acquire_with_cancel(
        &self,
        site: Site,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.acquire_inner(site, Some(deadline), Some(cancel)).await
    }

    async fn acquire_inner(
        &self,
        site: Site,
        deadline: Option<Instant>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        let bucket = self
            .buckets
            .get(&site)
            .ok_or(BrowserError::UnknownSite { site })?;
        let started = Instant::now();

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                debug!(site = %site, "rate limit wait cancelled");
                return Err(BrowserError::Cancelled { site });
            }

            let wait = {
                let mut bucket = bucket.lock().await;
                match bucket.try_take(Instant::now()) {
                    Ok(()) => {
                        trace!(site = %site, remaining = bucket.tokens, "rate limit token taken");
                        return Ok(());
                    }
                    Err(wait) => wait,
                }
            };

            let now = Instant::now();
            let mut wake = now + wait;
            if let Some(deadline) = deadline {
                if now >= deadline {
                    debug!(site = %site, waited_ms = now.duration_since(started).as_millis(), "rate limit deadline reached");
                    return Err(BrowserError::RateLimitTimeout {
                        site,
                        waited: now.duration_since(started),
                    });
                }
                wake = wake.min(deadline);
            }

            match cancel {
                Some(cancel) => {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            debug!(site = %site, "rate limit wait cancelled");
                            return Err(BrowserError::Cancelled { site });
                        }
                        () = tokio::time::sleep_until(wake) => {}
                    }
                }
                None => tokio::time::sleep_until(wake).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(tokens_per_min: u32) -> RateLimiter {
        RateLimiter::new([(Site::Olx, tokens_per_min)])
    }

    #[tokio::test(start_paused = true)]
    async fn test_bucket_starts_full() {
        let limiter = limiter(3);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire(Site::Olx).await.expect("token");
        }

        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_bucket_waits_for_refill() {
        let limiter = limiter(3);
        for _ in 0..3 {
            limiter.acquire(Site::Olx).await.expect("token");
        }

        let start = Instant::now();
        limiter.acquire(Site::Olx).await.expect("refilled token");
        let waited = start.elapsed();

        // 3 tokens per minute refill one token every 20 seconds.
        assert!(waited >= Duration::from_secs(20), "{waited:?}");
        assert!(waited < Duration::from_secs(21), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let limiter = limiter(1);
        limiter.acquire(Site::Olx).await.expect("token");

        let deadline = Instant::now() + Duration::from_secs(5);
        let err = limiter
            .acquire_until(Site::Olx, deadline)
            .await
            .expect_err("should time out");

        assert!(matches!(err, BrowserError::RateLimitTimeout { site: Site::Olx, .. }));
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_far_enough_succeeds() {
        let limiter = limiter(6);
        for _ in 0..6 {
            limiter.acquire(Site::Olx).await.expect("token");
        }

        let deadline = Instant::now() + Duration::from_secs(15);
        limiter
            .acquire_until(Site::Olx, deadline)
            .await
            .expect("token within 10s");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_releases_waiter() {
        let limiter = limiter(1);
        limiter.acquire(Site::Olx).await.expect("token");

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let deadline = Instant::now() + Duration::from_secs(600);
        let err = limiter
            .acquire_with_cancel(Site::Olx, deadline, &cancel)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, BrowserError::Cancelled { site: Site::Olx }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_does_not_consume() {
        let limiter = limiter(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let deadline = Instant::now() + Duration::from_secs(1);
        assert!(limiter
            .acquire_with_cancel(Site::Olx, deadline, &cancel)
            .await
            .is_err());

        let start = Instant::now();
        limiter.acquire(Site::Olx).await.expect("token still there");
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test]
    async fn test_unknown_site() {
        let limiter = limiter(10);
        let err = limiter
            .acquire(Site::Superbid)
            .await
            .expect_err("no bucket");
        assert!(matches!(err, BrowserError::UnknownSite { site: Site::Superbid }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquirers_never_overdraw() {
        let limiter = Arc::new(limiter(5));
        let deadline = Instant::now() + Duration::from_secs(1);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire_until(Site::Olx, deadline).await.is_ok()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.expect("join") {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_acquirer_waits_instead_of_failing() {
        let limiter = Arc::new(limiter(5));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire(Site::Olx).await.map(|()| Instant::now())
            }));
        }

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.expect("join").expect("token without deadline"));
        }
        finished.sort();

        // Five tokens up front, the sixth after one 12s refill.
        assert!(finished[..5].iter().all(|at| *at == start));
        let waited = finished[5] - start;
        assert!(waited >= Duration::from_secs(12), "{waited:?}");
        assert!(waited < Duration::from_secs(13), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sites_do_not_share_buckets() {
        let limiter = RateLimiter::new([(Site::Olx, 1), (Site::VivaReal, 1)]);
        let start = Instant::now();

        limiter.acquire(Site::Olx).await.expect("olx");
        limiter.acquire(Site::VivaReal).await.expect("viva real");

        assert_eq!(Instant::now(), start);
    }

    #[test]
    fn test_from_registry_covers_every_site() {
        let registry = SiteRegistry::builtin().expect("registry");
        let limiter = RateLimiter::from_registry(&registry);
        for site in Site::ALL {
            assert!(limiter.has_site(site), "{site}");
        }
    }
}
