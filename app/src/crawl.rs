//! Callbacks a crawl job drives while it runs.
//!
//! A job begins by resolving a credential, paces every page through the
//! site's token bucket and reports what it saw. Login walls and checkpoints
//! flag the credential for re-authentication.

use crate::error::CommandError;
use crate::state::AppState;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vigia_auth::AuthContext;
use vigia_core::{CredentialSourceKind, Site};
use vigia_sites::{classify_page, extract_listings, Listing, PageClass};

/// A running crawl job.
#[derive(Debug)]
pub struct CrawlJob {
    context: AuthContext,
    deadline: Instant,
    cancel: CancellationToken,
}

impl CrawlJob {
    /// Site being crawled.
    #[must_use]
    pub fn site(&self) -> Site {
        self.context.site()
    }

    /// Source of the credential in use.
    #[must_use]
    pub fn source(&self) -> CredentialSourceKind {
        self.context.source()
    }

    /// Resolved credential context.
    #[must_use]
    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    /// Time left before the job's budget runs out.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the job was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// What one fetched page turned out to be.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutcome {
    /// Classification of the page text
    pub class: PageClass,
    /// Listings found; empty unless the page is content
    pub listings: Vec<Listing>,
}

/// Resolve a credential and open a browsing session for a new job.
///
/// `budget` bounds how long the job may wait on rate limiting; `cancel`
/// aborts any wait early.
pub async fn begin_crawl(
    state: &AppState,
    user_id: &str,
    site: &str,
    budget: Duration,
    cancel: CancellationToken,
) -> Result<CrawlJob, CommandError> {
    let context = state.cascade.resolve(user_id, site).await?;
    info!(
        user_id = %context.user_id(),
        site = %context.site(),
        source = %context.source(),
        budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        "Crawl job started"
    );

    Ok(CrawlJob {
        context,
        deadline: Instant::now() + budget,
        cancel,
    })
}

/// Wait for the site's next request slot.
///
/// Fails with `RATE_LIMITED` when the job's deadline passes first and with
/// `CANCELLED` when its token fires.
pub async fn pace(state: &AppState, job: &CrawlJob) -> Result<(), CommandError> {
    state
        .rate_limiter
        .acquire_with_cancel(job.site(), job.deadline, &job.cancel)
        .await?;
    Ok(())
}

/// Classify page text and flag the credential when the page blocks it.
pub async fn report_page(
    state: &AppState,
    job: &CrawlJob,
    text: &str,
) -> Result<PageClass, CommandError> {
    let config = state.registry.get(job.site())?;
    let class = classify_page(text, &config.patterns);

    if class.blocks_session() {
        let reason = match class {
            PageClass::Checkpoint => "checkpoint detected",
            _ => "login wall detected",
        };

        if job.context.is_authenticated() {
            let flagged = state
                .cascade
                .report_login_wall(job.context.user_id().as_str(), job.site().as_str(), Some(reason))
                .await?;
            warn!(
                user_id = %job.context.user_id(),
                site = %job.site(),
                source = %job.source(),
                flagged,
                reason,
                "Credential rejected by site"
            );
        } else {
            warn!(site = %job.site(), reason, "Anonymous crawl blocked by site");
        }
    } else {
        debug!(site = %job.site(), class = ?class, "Page classified");
    }

    Ok(class)
}

/// Pace, load `url` and classify it, extracting listings from content pages.
pub async fn fetch_page(
    state: &AppState,
    job: &CrawlJob,
    url: &str,
) -> Result<PageOutcome, CommandError> {
    let session = job
        .context
        .session()
        .ok_or_else(|| CommandError::new("CRAWL_FINISHED", "Crawl job already released"))?;

    pace(state, job).await?;
    session.navigate(url).await?;

    let text = session.visible_text().await?;
    let class = report_page(state, job, &text).await?;

    let listings = if class == PageClass::Content {
        let config = state.registry.get(job.site())?;
        let html = session.content().await?;
        extract_listings(config, &html)
    } else {
        Vec::new()
    };

    debug!(site = %job.site(), url, listings = listings.len(), "Page fetched");
    Ok(PageOutcome { class, listings })
}

/// End a job and release its browsing session.
pub async fn finish(mut job: CrawlJob) -> Result<(), CommandError> {
    let site = job.site();
    job.context.cleanup().await?;
    info!(site = %site, "Crawl job finished");
    Ok(())
}
