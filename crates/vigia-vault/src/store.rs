//! Encrypted per-user, per-site session store.
//!
//! Wraps a [`SessionRepository`] and owns every lifecycle transition of a
//! stored session. Payloads are sealed before they reach the repository and
//! plaintext never leaves this module except as the return value of
//! [`SessionStore::load`].

use crate::cipher::SealedBlob;
use crate::error::{DecryptFailure, Result, VaultError};
use crate::key::Keyring;
use crate::payload::StorageState;
use chrono::Duration;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use vigia_core::{SessionEvent, SessionId, SessionStatus, Site, Timestamp, UserId};
use vigia_db::{NewSession, SessionKey, SessionMetadata, SessionRecord, SessionRepository};

/// Default session lifetime in days.
pub const DEFAULT_TTL_DAYS: u32 = 30;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    /// Row identifier
    pub session_id: SessionId,
    /// Number of cookies in the payload
    pub cookie_count: usize,
    /// Number of origins in the payload
    pub origin_count: usize,
    /// Distinct cookie domains
    pub domains: Vec<String>,
    /// When the session stops being usable
    pub expires_at: Timestamp,
}

/// A decrypted, usable session.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// Row identifier
    pub session_id: SessionId,
    /// Site the credential belongs to
    pub site: Site,
    /// Decrypted storage state
    pub state: StorageState,
}

/// Summary of a stored session. Never contains the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Row identifier
    pub session_id: SessionId,
    /// Site of the session
    pub site: Site,
    /// Domain of the session
    pub domain: String,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Optional account label
    pub account_label: Option<String>,
    /// Payload counts, domains and error history
    pub metadata: SessionMetadata,
    /// Key version of the stored blob
    pub key_version: u32,
    /// Expiry time
    pub expires_at: Timestamp,
    /// Last successful load
    pub last_used_at: Option<Timestamp>,
    /// Last reported error
    pub last_error_at: Option<Timestamp>,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification time
    pub updated_at: Timestamp,
}

impl From<SessionRecord> for SessionSummary {
    fn from(record: SessionRecord) -> Self {
        Self {
            session_id: record.id,
            site: record.site,
            domain: record.domain,
            status: record.status,
            account_label: record.account_label,
            metadata: record.metadata,
            key_version: record.key_version,
            expires_at: record.expires_at,
            last_used_at: record.last_used_at,
            last_error_at: record.last_error_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Session store over a repository and a keyring.
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    keyring: Arc<Keyring>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("keyring", &self.keyring)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store whose uploads live for `ttl_days`.
    #[must_use]
    pub fn new(repo: Arc<dyn SessionRepository>, keyring: Keyring, ttl_days: u32) -> Self {
        Self {
            repo,
            keyring: Arc::new(keyring),
            ttl: Duration::days(i64::from(ttl_days)),
        }
    }

    fn key_for(user_id: &str, site: &str) -> Result<SessionKey> {
        // Site first: an unknown site is rejected before anything else.
        let site: Site = site.parse()?;
        let user_id = UserId::new(user_id)?;
        Ok(SessionKey::primary(user_id, site))
    }

    /// Validate, seal and upsert a payload, resetting the session to `ACTIVE`.
    ///
    /// # Errors
    /// - `UnsupportedSite` for an unknown site
    /// - `InvalidPayloadShape` if `payload` lacks `cookies`/`origins` arrays
    /// - `Validation` if the expiry falls outside the representable range
    /// - `KeyUnavailable`, `Encryption`, `Database` on infrastructure failures
    pub async fn save(
        &self,
        user_id: &str,
        site: &str,
        payload: &Value,
        account_label: Option<&str>,
    ) -> Result<SaveOutcome> {
        let key = Self::key_for(user_id, site)?;
        let state = StorageState::from_value(payload.clone())?;
        let summary = state.summary();

        let (key_version, secret) = self.keyring.current()?;
        let blob = SealedBlob::seal(&state.to_bytes()?, secret)?;

        let now = Timestamp::now();
        let expires_at = now.plus(self.ttl)?;
        let record = self
            .repo
            .upsert(NewSession {
                key: key.clone(),
                encrypted_blob: blob.to_string(),
                key_version,
                account_label: account_label.map(ToString::to_string),
                metadata: SessionMetadata {
                    cookie_count: summary.cookie_count,
                    origin_count: summary.origin_count,
                    domains: summary.domains.clone(),
                    uploaded_at: Some(now),
                    last_error_reason: None,
                    last_error_at: None,
                },
                expires_at,
            })
            .await?;

        tracing::info!(
            user_id = %key.user_id,
            site = %key.site,
            cookies = summary.cookie_count,
            origins = summary.origin_count,
            key_version,
            "Session saved"
        );

        Ok(SaveOutcome {
            session_id: record.id,
            cookie_count: summary.cookie_count,
            origin_count: summary.origin_count,
            domains: summary.domains,
            expires_at,
        })
    }

    /// Decrypt and return a usable session.
    ///
    /// Sessions whose status is not `ACTIVE` are rejected without touching
    /// the ciphertext. A session past its expiry is flipped to `EXPIRED`. A
    /// payload that decrypts but no longer has the expected shape is flipped
    /// to `INVALID`. Rows sealed under an older key version are re-sealed
    /// with the current key.
    ///
    /// # Errors
    /// `SessionNotFound`, `SessionNeedsReauth`, `SessionExpiredByStatus`,
    /// `SessionExpiredByTime`, `SessionInvalid`, `Decryption`, or
    /// infrastructure errors.
    pub async fn load(&self, user_id: &str, site: &str) -> Result<LoadedSession> {
        let key = Self::key_for(user_id, site)?;
        let record = self
            .repo
            .find(&key)
            .await?
            .ok_or(VaultError::SessionNotFound { site: key.site })?;

        match record.status {
            SessionStatus::Active => {}
            SessionStatus::NeedsReauth => {
                return Err(VaultError::SessionNeedsReauth { site: key.site })
            }
            SessionStatus::Expired => {
                return Err(VaultError::SessionExpiredByStatus { site: key.site })
            }
            SessionStatus::Invalid => return Err(VaultError::SessionInvalid { site: key.site }),
        }

        let now = Timestamp::now();
        if record.expires_at.is_before(&now) {
            // Conditional on the stored expiry so a concurrent re-upload survives.
            self.repo.expire_if_past(&key, now).await?;
            tracing::info!(
                user_id = %key.user_id,
                site = %key.site,
                expires_at = %record.expires_at,
                "Session expired by time"
            );
            return Err(VaultError::SessionExpiredByTime {
                site: key.site,
                expired_at: record.expires_at,
            });
        }

        let plaintext = self.open(&record).inspect_err(|e| {
            tracing::warn!(
                user_id = %key.user_id,
                site = %key.site,
                key_version = record.key_version,
                error = %e,
                "Session blob could not be decrypted"
            );
        })?;

        let Ok(state) = StorageState::from_slice(&plaintext) else {
            self.repo.invalidate_blob(&key, &record.encrypted_blob).await?;
            tracing::warn!(
                user_id = %key.user_id,
                site = %key.site,
                "Decrypted session failed the payload shape check"
            );
            return Err(VaultError::SessionInvalid { site: key.site });
        };

        self.repo.touch_last_used(&key, now).await?;

        if let Err(e) = self.reseal_if_stale(&key, &record, &state).await {
            tracing::warn!(
                user_id = %key.user_id,
                site = %key.site,
                error = %e,
                "Failed to re-encrypt session under the current key"
            );
        }

        tracing::debug!(user_id = %key.user_id, site = %key.site, "Session loaded");

        Ok(LoadedSession {
            session_id: record.id,
            site: key.site,
            state,
        })
    }

    fn open(&self, record: &SessionRecord) -> Result<zeroize::Zeroizing<Vec<u8>>> {
        let secret = self.keyring.get(record.key_version).ok_or_else(|| {
            DecryptFailure::Cipher(format!("no key for version {}", record.key_version))
        })?;
        let blob: SealedBlob = record.encrypted_blob.parse()?;
        Ok(blob.open(secret)?)
    }

    async fn reseal_if_stale(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        state: &StorageState,
    ) -> Result<()> {
        let (current_version, secret) = self.keyring.current()?;
        if record.key_version >= current_version {
            return Ok(());
        }

        let blob = SealedBlob::seal(&state.to_bytes()?, secret)?;
        self.repo
            .replace_blob(key, &blob.to_string(), current_version)
            .await?;

        tracing::info!(
            user_id = %key.user_id,
            site = %key.site,
            from = record.key_version,
            to = current_version,
            "Session re-encrypted under current key"
        );
        Ok(())
    }

    /// Flag a session after the crawler hit a login wall.
    ///
    /// Records `reason` and the time in the metadata and sets
    /// `last_error_at`. The status becomes `NEEDS_REAUTH` unless it is
    /// already more severe. Returns `false` if no session exists.
    ///
    /// # Errors
    /// `UnsupportedSite` or `Database`.
    pub async fn mark_needs_reauth(
        &self,
        user_id: &str,
        site: &str,
        reason: Option<&str>,
    ) -> Result<bool> {
        let key = Self::key_for(user_id, site)?;
        let target = SessionStatus::Active.apply(SessionEvent::LoginWall);

        let updated = self
            .repo
            .record_error(&key, target, reason, Timestamp::now())
            .await?;
        if !updated {
            return Ok(false);
        }
        tracing::info!(
            user_id = %key.user_id,
            site = %key.site,
            status = %target,
            reason = reason.unwrap_or("unspecified"),
            "Session marked for re-authentication"
        );
        Ok(true)
    }

    /// Set the session to `EXPIRED`. Returns the number of rows affected;
    /// an `INVALID` session is left as is.
    ///
    /// # Errors
    /// `UnsupportedSite` or `Database`.
    pub async fn mark_expired(&self, user_id: &str, site: &str) -> Result<u64> {
        let key = Self::key_for(user_id, site)?;
        let target = SessionStatus::Active.apply(SessionEvent::MarkedExpired);
        let affected = self.repo.escalate_status(&key, target).await?;
        tracing::info!(user_id = %key.user_id, site = %key.site, affected, "Session marked expired");
        Ok(affected)
    }

    /// Delete a session. Returns whether one existed.
    ///
    /// # Errors
    /// `UnsupportedSite` or `Database`.
    pub async fn delete(&self, user_id: &str, site: &str) -> Result<bool> {
        let key = Self::key_for(user_id, site)?;
        let deleted = self.repo.delete(&key).await?;
        tracing::info!(user_id = %key.user_id, site = %key.site, deleted, "Session deleted");
        Ok(deleted)
    }

    /// Whether a session exists with status `ACTIVE`.
    ///
    /// # Errors
    /// `UnsupportedSite` or `Database`.
    pub async fn has_active_session(&self, user_id: &str, site: &str) -> Result<bool> {
        Ok(self.status(user_id, site).await? == Some(SessionStatus::Active))
    }

    /// Current status, or `None` if no session exists.
    ///
    /// # Errors
    /// `UnsupportedSite` or `Database`.
    pub async fn status(&self, user_id: &str, site: &str) -> Result<Option<SessionStatus>> {
        let key = Self::key_for(user_id, site)?;
        Ok(self.repo.find(&key).await?.map(|record| record.status))
    }

    /// Summary of a single session.
    ///
    /// # Errors
    /// `UnsupportedSite` or `Database`.
    pub async fn summary(&self, user_id: &str, site: &str) -> Result<Option<SessionSummary>> {
        let key = Self::key_for(user_id, site)?;
        Ok(self.repo.find(&key).await?.map(SessionSummary::from))
    }

    /// Summaries of every session of a user.
    ///
    /// # Errors
    /// `Validation` for a malformed user id, or `Database`.
    pub async fn list_all(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let user_id = UserId::new(user_id)?;
        let records = self.repo.list_for_user(&user_id).await?;
        Ok(records.into_iter().map(SessionSummary::from).collect())
    }
}
