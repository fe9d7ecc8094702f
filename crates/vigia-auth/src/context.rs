//! Scoped ownership of a crawl job's browsing session.

use crate::error::Result;
use std::fmt;
use tracing::{debug, warn};
use vigia_browser::BrowsingSession;
use vigia_core::{CredentialSourceKind, SessionId, Site, UserId};

/// Outcome of credential resolution, owning the opened browsing session.
///
/// Call [`cleanup`](Self::cleanup) when the crawl job ends. A context dropped
/// without cleanup closes its session on the current Tokio runtime.
pub struct AuthContext {
    user_id: UserId,
    site: Site,
    source: CredentialSourceKind,
    session_id: Option<SessionId>,
    session: Option<Box<dyn BrowsingSession>>,
}

impl AuthContext {
    pub(crate) fn new(
        user_id: UserId,
        site: Site,
        source: CredentialSourceKind,
        session_id: Option<SessionId>,
        session: Box<dyn BrowsingSession>,
    ) -> Self {
        Self {
            user_id,
            site,
            source,
            session_id,
            session: Some(session),
        }
    }

    /// Whether a credential is loaded into the session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.source != CredentialSourceKind::Anonymous
    }

    /// Source that produced the credential.
    #[must_use]
    pub fn source(&self) -> CredentialSourceKind {
        self.source
    }

    /// Stored session row, when the credential came from the session store.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// User the context was resolved for.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Site the context was resolved for.
    #[must_use]
    pub fn site(&self) -> Site {
        self.site
    }

    /// The browsing session, until cleanup.
    #[must_use]
    pub fn session(&self) -> Option<&dyn BrowsingSession> {
        self.session.as_deref()
    }

    /// Whether the session was already released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }

    /// Release the browsing session. Later calls do nothing.
    pub async fn cleanup(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session.close().await?;
        debug!(user_id = %self.user_id, site = %self.site, source = %self.source, "auth context released");
        Ok(())
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .field("site", &self.site)
            .field("source", &self.source)
            .field("session_id", &self.session_id)
            .field("released", &self.is_released())
            .finish()
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        let site = self.site;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!(site = %site, error = %e, "failed to close dropped browsing session");
                    }
                });
                debug!(site = %site, "auth context dropped without cleanup; closing in background");
            }
            Err(_) => {
                warn!(site = %site, "auth context dropped outside a runtime; browser left to its own drop");
            }
        }
    }
}
