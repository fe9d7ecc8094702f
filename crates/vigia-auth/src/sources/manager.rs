//! In-memory cache of recently working credentials.

use crate::credential::{Credential, CredentialSource};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use vigia_core::{CredentialSourceKind, Site, UserId};
use vigia_vault::StorageState;

#[derive(Debug)]
struct Cached {
    state: StorageState,
    stored_at: Instant,
}

/// Credentials that recently opened a working browser session, per user and site.
///
/// Entries live for a fixed TTL and are evicted when a login wall is reported.
#[derive(Debug)]
pub struct SessionManager {
    ttl: Duration,
    entries: RwLock<HashMap<(UserId, Site), Cached>>,
}

impl SessionManager {
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached credential, if present and still fresh.
    pub async fn get(&self, user_id: &UserId, site: Site) -> Option<StorageState> {
        let key = (user_id.clone(), site);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(cached) if cached.stored_at.elapsed() < self.ttl => {
                    return Some(cached.state.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: drop it unless it was refreshed in between.
        let mut entries = self.entries.write().await;
        if entries
            .get(&key)
            .is_some_and(|cached| cached.stored_at.elapsed() >= self.ttl)
        {
            entries.remove(&key);
            debug!(user_id = %user_id, site = %site, "cached credential expired");
        }
        None
    }

    /// Remember a credential that just worked.
    pub async fn store(&self, user_id: &UserId, site: Site, state: StorageState) {
        self.entries.write().await.insert(
            (user_id.clone(), site),
            Cached {
                state,
                stored_at: Instant::now(),
            },
        );
        debug!(user_id = %user_id, site = %site, "credential cached");
    }

    /// Forget a credential. Returns whether one was cached.
    pub async fn evict(&self, user_id: &UserId, site: Site) -> bool {
        let removed = self
            .entries
            .write()
            .await
            .remove(&(user_id.clone(), site))
            .is_some();
        if removed {
            debug!(user_id = %user_id, site = %site, "cached credential evicted");
        }
        removed
    }

    /// Number of cached entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Cascade adapter over a shared [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionManagerSource {
    manager: Arc<SessionManager>,
}

impl SessionManagerSource {
    /// Wrap a shared manager.
    #[must_use]
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl CredentialSource for SessionManagerSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::SessionManager
    }

    async fn try_resolve(&self, user_id: &UserId, site: Site) -> Result<Option<Credential>> {
        Ok(self
            .manager
            .get(user_id, site)
            .await
            .map(|state| Credential::new(CredentialSourceKind::SessionManager, state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> StorageState {
        StorageState::from_value(json!({"cookies": [], "origins": []})).expect("valid state")
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).expect("valid user")
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let manager = SessionManager::new(Duration::from_secs(60));
        manager.store(&user("u1"), Site::Olx, state()).await;

        assert!(manager.get(&user("u1"), Site::Olx).await.is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(manager.get(&user("u1"), Site::Olx).await.is_none());
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_are_per_user_and_site() {
        let manager = SessionManager::new(Duration::from_secs(60));
        manager.store(&user("u1"), Site::Olx, state()).await;

        assert!(manager.get(&user("u2"), Site::Olx).await.is_none());
        assert!(manager.get(&user("u1"), Site::VivaReal).await.is_none());
    }

    #[tokio::test]
    async fn test_evict() {
        let manager = SessionManager::new(Duration::from_secs(60));
        manager.store(&user("u1"), Site::Olx, state()).await;

        assert!(manager.evict(&user("u1"), Site::Olx).await);
        assert!(!manager.evict(&user("u1"), Site::Olx).await);
        assert!(manager.get(&user("u1"), Site::Olx).await.is_none());
    }

    #[tokio::test]
    async fn test_source_reports_session_manager_kind() {
        let manager = Arc::new(SessionManager::new(Duration::from_secs(60)));
        manager.store(&user("u1"), Site::Olx, state()).await;

        let credential = SessionManagerSource::new(manager)
            .try_resolve(&user("u1"), Site::Olx)
            .await
            .expect("resolve")
            .expect("cached");
        assert_eq!(credential.source, CredentialSourceKind::SessionManager);
    }
}
