//! The credential source seam.

use crate::error::Result;
use async_trait::async_trait;
use vigia_core::{CredentialSourceKind, SessionId, Site, UserId};
use vigia_vault::StorageState;

/// A storage state found by one of the sources.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Where it came from
    pub source: CredentialSourceKind,
    /// Stored session row, for credentials read from the session store
    pub session_id: Option<SessionId>,
    /// Shape-checked storage state
    pub state: StorageState,
}

impl Credential {
    /// Credential without a backing session row.
    #[must_use]
    pub fn new(source: CredentialSourceKind, state: StorageState) -> Self {
        Self {
            source,
            session_id: None,
            state,
        }
    }
}

/// One place a credential can come from.
///
/// `Ok(None)` means "nothing here, try the next source". Errors are
/// reported by the cascade and never stop it.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Which source this is
    fn kind(&self) -> CredentialSourceKind;

    /// Look for a credential for `user_id` on `site`.
    async fn try_resolve(&self, user_id: &UserId, site: Site) -> Result<Option<Credential>>;
}
