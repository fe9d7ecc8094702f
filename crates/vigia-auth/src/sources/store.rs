//! Stored, encrypted sessions.

use crate::credential::{Credential, CredentialSource};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use tracing::debug;
use vigia_core::{CredentialSourceKind, Site, UserId};
use vigia_vault::{SessionStore, VaultError};

/// Reads the user's uploaded session from the [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionStoreSource {
    store: SessionStore,
}

impl SessionStoreSource {
    /// Wrap a session store.
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CredentialSource for SessionStoreSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::Db
    }

    async fn try_resolve(&self, user_id: &UserId, site: Site) -> Result<Option<Credential>> {
        match self.store.load(user_id.as_str(), site.as_str()).await {
            Ok(loaded) => Ok(Some(Credential {
                source: CredentialSourceKind::Db,
                session_id: Some(loaded.session_id),
                state: loaded.state,
            })),
            // Lifecycle outcomes: the session exists but is not usable.
            Err(
                e @ (VaultError::SessionNotFound { .. }
                | VaultError::SessionNeedsReauth { .. }
                | VaultError::SessionExpiredByStatus { .. }
                | VaultError::SessionExpiredByTime { .. }
                | VaultError::SessionInvalid { .. }),
            ) => {
                debug!(user_id = %user_id, site = %site, reason = %e, "no usable stored session");
                Ok(None)
            }
            Err(e) => Err(AuthError::source_failure(
                CredentialSourceKind::Db,
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use vigia_db::Database;
    use vigia_vault::{Keyring, DEFAULT_TTL_DAYS};

    async fn store() -> SessionStore {
        let db = Database::open_and_migrate(":memory:", 1)
            .await
            .expect("create database");
        SessionStore::new(Arc::new(db), Keyring::single(1, [7; 32]), DEFAULT_TTL_DAYS)
    }

    fn user() -> UserId {
        UserId::new("u1").expect("valid user")
    }

    #[tokio::test]
    async fn test_active_session_resolves() {
        let store = store().await;
        let outcome = store
            .save("u1", "OLX", &json!({"cookies": [], "origins": []}), None)
            .await
            .expect("save");

        let source = SessionStoreSource::new(store);
        let credential = source
            .try_resolve(&user(), Site::Olx)
            .await
            .expect("resolve")
            .expect("credential");

        assert_eq!(credential.source, CredentialSourceKind::Db);
        assert_eq!(credential.session_id, Some(outcome.session_id));
    }

    #[tokio::test]
    async fn test_missing_or_flagged_session_yields_none() {
        let store = store().await;
        let source = SessionStoreSource::new(store.clone());
        assert!(source
            .try_resolve(&user(), Site::Olx)
            .await
            .expect("resolve")
            .is_none());

        store
            .save("u1", "OLX", &json!({"cookies": [], "origins": []}), None)
            .await
            .expect("save");
        store
            .mark_needs_reauth("u1", "OLX", Some("login wall"))
            .await
            .expect("mark");
        assert!(source
            .try_resolve(&user(), Site::Olx)
            .await
            .expect("resolve")
            .is_none());
    }
}
