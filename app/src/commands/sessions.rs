//! Session management commands.

use crate::error::CommandError;
use crate::state::AppState;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use vigia_core::{SessionStatus, Site, UserId};
use vigia_vault::{PayloadSummary, SaveOutcome, SessionSummary, VaultError};

/// Status of one user's session on one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusOutput {
    /// Site that was queried
    pub site: Site,
    /// Stored status, `None` when nothing is stored
    pub status: Option<SessionStatus>,
    /// Whether the session is `ACTIVE` and not past its expiry
    pub has_active_session: bool,
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutput {
    /// Whether a session was removed
    pub deleted: bool,
}

/// Result of a validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutput {
    /// Whether the session can be used for a crawl
    pub valid: bool,
    /// Status after validation
    pub status: Option<SessionStatus>,
    /// Error code explaining an invalid session
    pub reason: Option<String>,
    /// Payload counts, present for a valid session
    pub summary: Option<PayloadSummary>,
}

/// Resolve a site identifier through the registry.
fn site_of(state: &AppState, site: &str) -> Result<Site, CommandError> {
    Ok(state.registry.get_by_name(site)?.site)
}

/// Drop the cached credential so the next crawl sees the store change.
async fn evict_cached(state: &AppState, user_id: &str, site: Site) {
    if let Ok(user_id) = UserId::new(user_id) {
        state.cascade.manager().evict(&user_id, site).await;
    }
}

/// List every stored session of a user, without payloads.
pub async fn list_sessions(
    state: &AppState,
    user_id: String,
) -> Result<Vec<SessionSummary>, CommandError> {
    let sessions = state.store.list_all(&user_id).await?;
    info!(user_id = %user_id, count = sessions.len(), "Listed sessions");
    Ok(sessions)
}

/// Report the stored status of a user's session on a site.
pub async fn session_status(
    state: &AppState,
    user_id: String,
    site: String,
) -> Result<SessionStatusOutput, CommandError> {
    let parsed = site_of(state, &site)?;
    let status = state.store.status(&user_id, &site).await?;
    let has_active_session = state.store.has_active_session(&user_id, &site).await?;

    Ok(SessionStatusOutput {
        site: parsed,
        status,
        has_active_session,
    })
}

/// Encrypt and store an uploaded storage state, replacing any previous one.
pub async fn upload_session(
    state: &AppState,
    user_id: String,
    site: String,
    payload: Value,
    account_label: Option<String>,
) -> Result<SaveOutcome, CommandError> {
    let parsed = site_of(state, &site)?;
    let outcome = state
        .store
        .save(&user_id, &site, &payload, account_label.as_deref())
        .await?;

    evict_cached(state, &user_id, parsed).await;

    info!(
        user_id = %user_id,
        site = %parsed,
        cookies = outcome.cookie_count,
        "Session uploaded"
    );
    Ok(outcome)
}

/// Delete a user's session on a site.
pub async fn delete_session(
    state: &AppState,
    user_id: String,
    site: String,
) -> Result<DeleteOutput, CommandError> {
    let parsed = site_of(state, &site)?;
    let deleted = state.store.delete(&user_id, &site).await?;

    evict_cached(state, &user_id, parsed).await;

    info!(user_id = %user_id, site = %parsed, deleted, "Session delete requested");
    Ok(DeleteOutput { deleted })
}

/// Check that a stored session still decrypts and is usable.
///
/// Lifecycle failures come back as `valid: false`; infrastructure failures
/// are errors.
pub async fn validate_session(
    state: &AppState,
    user_id: String,
    site: String,
) -> Result<ValidationOutput, CommandError> {
    site_of(state, &site)?;

    match state.store.load(&user_id, &site).await {
        Ok(loaded) => Ok(ValidationOutput {
            valid: true,
            status: Some(SessionStatus::Active),
            reason: None,
            summary: Some(loaded.state.summary()),
        }),
        Err(
            err @ (VaultError::SessionNotFound { .. }
            | VaultError::SessionNeedsReauth { .. }
            | VaultError::SessionExpiredByStatus { .. }
            | VaultError::SessionExpiredByTime { .. }
            | VaultError::SessionInvalid { .. }
            | VaultError::Decryption(_)),
        ) => {
            warn!(user_id = %user_id, site = %site, error = %err, "Session failed validation");
            let reason = CommandError::from(err).code;
            let status = state.store.status(&user_id, &site).await?;
            Ok(ValidationOutput {
                valid: false,
                status,
                reason: Some(reason),
                summary: None,
            })
        }
        Err(err) => Err(err.into()),
    }
}
