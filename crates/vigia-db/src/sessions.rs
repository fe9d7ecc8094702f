//! Persistence for encrypted site sessions.
//!
//! The `site_sessions` table holds one row per natural key
//! `(user_id, site, domain)`. Rows only ever carry ciphertext; sealing and
//! opening happen in `vigia-vault`.

use crate::error::{DatabaseError, Result};
use crate::Database;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use vigia_core::{SessionId, SessionStatus, Site, Timestamp, UserId};

/// Natural key of a stored session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Owning user
    pub user_id: UserId,
    /// Target marketplace
    pub site: Site,
    /// Domain the credential belongs to
    pub domain: String,
}

impl SessionKey {
    /// Key for the site's primary domain.
    #[must_use]
    pub fn primary(user_id: UserId, site: Site) -> Self {
        Self {
            user_id,
            site,
            domain: site.primary_domain().to_string(),
        }
    }
}

/// JSON bag stored next to the ciphertext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionMetadata {
    /// Number of cookies in the uploaded payload
    pub cookie_count: usize,
    /// Number of origins in the uploaded payload
    pub origin_count: usize,
    /// Distinct cookie domains, leading dots stripped, first-seen order
    pub domains: Vec<String>,
    /// When the payload was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<Timestamp>,
    /// Reason given by the last error report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_reason: Option<String>,
    /// When the last error was reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<Timestamp>,
}

/// A stored session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Row identifier, stable across re-uploads
    pub id: SessionId,
    /// Owning user
    pub user_id: UserId,
    /// Target marketplace
    pub site: Site,
    /// Domain the credential belongs to
    pub domain: String,
    /// Lifecycle status
    pub status: SessionStatus,
    /// `nonce:tag:ciphertext` in hex
    pub encrypted_blob: String,
    /// Version of the key that sealed `encrypted_blob`
    pub key_version: u32,
    /// Optional human label for the account
    pub account_label: Option<String>,
    /// Payload summary and error history
    pub metadata: SessionMetadata,
    /// Time after which the session is no longer usable
    pub expires_at: Timestamp,
    /// Last successful load
    pub last_used_at: Option<Timestamp>,
    /// Last reported error
    pub last_error_at: Option<Timestamp>,
    /// Row creation time
    pub created_at: Timestamp,
    /// Last modification time
    pub updated_at: Timestamp,
}

impl SessionRecord {
    /// Natural key of this row.
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey {
            user_id: self.user_id.clone(),
            site: self.site,
            domain: self.domain.clone(),
        }
    }
}

/// Input for an upload.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Natural key to upsert
    pub key: SessionKey,
    /// Sealed payload
    pub encrypted_blob: String,
    /// Version of the sealing key
    pub key_version: u32,
    /// Optional label; a re-upload without one keeps the stored label
    pub account_label: Option<String>,
    /// Payload summary
    pub metadata: SessionMetadata,
    /// Expiry of the new credential
    pub expires_at: Timestamp,
}

/// Keyed persistence for sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or overwrite by natural key, forcing `ACTIVE` and clearing `last_error_at`.
    async fn upsert(&self, session: NewSession) -> Result<SessionRecord>;

    /// Find a session by natural key.
    async fn find(&self, key: &SessionKey) -> Result<Option<SessionRecord>>;

    /// Raise the status to `target` unless the row is already more severe.
    ///
    /// Returns the number of rows now at `target`.
    async fn escalate_status(&self, key: &SessionKey, target: SessionStatus) -> Result<u64>;

    /// Set an `ACTIVE` row to `EXPIRED` if its stored expiry is before `now`.
    ///
    /// A row re-uploaded since it was read carries a later expiry and is
    /// left alone. Returns the number of rows expired.
    async fn expire_if_past(&self, key: &SessionKey, now: Timestamp) -> Result<u64>;

    /// Set the row to `INVALID` only while it still holds `blob`.
    async fn invalidate_blob(&self, key: &SessionKey, blob: &str) -> Result<u64>;

    /// Record an error report and raise the status to `target` unless the
    /// row is already more severe.
    ///
    /// Only `lastErrorReason` and `lastErrorAt` change inside the metadata
    /// bag. Returns `false` when no row exists.
    async fn record_error(
        &self,
        key: &SessionKey,
        target: SessionStatus,
        reason: Option<&str>,
        at: Timestamp,
    ) -> Result<bool>;

    /// Update `last_used_at`.
    async fn touch_last_used(&self, key: &SessionKey, at: Timestamp) -> Result<()>;

    /// Replace the ciphertext after re-sealing it under another key version.
    async fn replace_blob(&self, key: &SessionKey, blob: &str, key_version: u32) -> Result<()>;

    /// Delete a session. Returns whether a row existed.
    async fn delete(&self, key: &SessionKey) -> Result<bool>;

    /// All sessions of a user, ordered by site.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SessionRecord>>;
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, site, domain, status, encrypted_blob, key_version, \
     account_label, metadata, expires_at, last_used_at, last_error_at, created_at, updated_at \
     FROM site_sessions";

/// Statuses that `target` may overwrite, as a bound `IN (...)` list.
fn escalatable_from(target: SessionStatus) -> Vec<&'static str> {
    SessionStatus::ALL
        .iter()
        .filter(|status| **status <= target)
        .map(SessionStatus::as_str)
        .collect()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn decode<T, E: std::fmt::Display>(
    column: &str,
    parsed: std::result::Result<T, E>,
) -> Result<T> {
    parsed.map_err(|e| DatabaseError::Decode(format!("column '{column}': {e}")))
}

fn parse_timestamp(column: &str, value: &str) -> Result<Timestamp> {
    decode(column, Timestamp::from_rfc3339(value))
}

fn parse_optional_timestamp(column: &str, value: Option<String>) -> Result<Option<Timestamp>> {
    value.map(|v| parse_timestamp(column, &v)).transpose()
}

fn row_to_record(row: &SqliteRow) -> Result<SessionRecord> {
    let user_id: String = row.try_get("user_id")?;
    let site: String = row.try_get("site")?;
    let status: String = row.try_get("status")?;
    let key_version: i64 = row.try_get("key_version")?;
    let metadata: String = row.try_get("metadata")?;
    let expires_at: String = row.try_get("expires_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(SessionRecord {
        id: SessionId::from_stored(row.try_get::<String, _>("id")?),
        user_id: decode("user_id", UserId::new(user_id))?,
        site: decode("site", site.parse::<Site>())?,
        domain: row.try_get("domain")?,
        status: decode("status", status.parse::<SessionStatus>())?,
        encrypted_blob: row.try_get("encrypted_blob")?,
        key_version: decode("key_version", u32::try_from(key_version))?,
        account_label: row.try_get("account_label")?,
        metadata: serde_json::from_str(&metadata)?,
        expires_at: parse_timestamp("expires_at", &expires_at)?,
        last_used_at: parse_optional_timestamp("last_used_at", row.try_get("last_used_at")?)?,
        last_error_at: parse_optional_timestamp("last_error_at", row.try_get("last_error_at")?)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait]
impl SessionRepository for Database {
    async fn upsert(&self, session: NewSession) -> Result<SessionRecord> {
        let now = Timestamp::now().to_rfc3339();
        let metadata = serde_json::to_string(&session.metadata)?;

        sqlx::query(
            "INSERT INTO site_sessions \
             (id, user_id, site, domain, status, encrypted_blob, key_version, account_label, \
              metadata, expires_at, last_used_at, last_error_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 'ACTIVE', ?, ?, ?, ?, ?, NULL, NULL, ?, ?) \
             ON CONFLICT(user_id, site, domain) DO UPDATE SET \
                status = 'ACTIVE', \
                encrypted_blob = excluded.encrypted_blob, \
                key_version = excluded.key_version, \
                account_label = COALESCE(excluded.account_label, site_sessions.account_label), \
                metadata = excluded.metadata, \
                expires_at = excluded.expires_at, \
                last_error_at = NULL, \
                updated_at = excluded.updated_at",
        )
        .bind(SessionId::generate().as_str())
        .bind(session.key.user_id.as_str())
        .bind(session.key.site.as_str())
        .bind(&session.key.domain)
        .bind(&session.encrypted_blob)
        .bind(i64::from(session.key_version))
        .bind(&session.account_label)
        .bind(&metadata)
        .bind(session.expires_at.to_rfc3339())
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await?;

        tracing::debug!(
            user_id = %session.key.user_id,
            site = %session.key.site,
            "Session row upserted"
        );

        self.find(&session.key).await?.ok_or(DatabaseError::NotFound)
    }

    async fn find(&self, key: &SessionKey) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND site = ? AND domain = ?"
        ))
        .bind(key.user_id.as_str())
        .bind(key.site.as_str())
        .bind(&key.domain)
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn escalate_status(&self, key: &SessionKey, target: SessionStatus) -> Result<u64> {
        let from = escalatable_from(target);
        let sql = format!(
            "UPDATE site_sessions SET status = ?, updated_at = ? \
             WHERE user_id = ? AND site = ? AND domain = ? AND status IN ({})",
            placeholders(from.len())
        );

        let mut query = sqlx::query(&sql)
            .bind(target.as_str())
            .bind(Timestamp::now().to_rfc3339())
            .bind(key.user_id.as_str())
            .bind(key.site.as_str())
            .bind(&key.domain);
        for status in from {
            query = query.bind(status);
        }

        let result = query.execute(self.pool()).await?;
        Ok(result.rows_affected())
    }

    async fn expire_if_past(&self, key: &SessionKey, now: Timestamp) -> Result<u64> {
        // Stored timestamps vary in fractional digits, so compare as julian days.
        let result = sqlx::query(
            "UPDATE site_sessions SET status = 'EXPIRED', updated_at = ? \
             WHERE user_id = ? AND site = ? AND domain = ? \
               AND status = 'ACTIVE' AND julianday(expires_at) < julianday(?)",
        )
        .bind(Timestamp::now().to_rfc3339())
        .bind(key.user_id.as_str())
        .bind(key.site.as_str())
        .bind(&key.domain)
        .bind(now.to_rfc3339())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn invalidate_blob(&self, key: &SessionKey, blob: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE site_sessions SET status = 'INVALID', updated_at = ? \
             WHERE user_id = ? AND site = ? AND domain = ? AND encrypted_blob = ?",
        )
        .bind(Timestamp::now().to_rfc3339())
        .bind(key.user_id.as_str())
        .bind(key.site.as_str())
        .bind(&key.domain)
        .bind(blob)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn record_error(
        &self,
        key: &SessionKey,
        target: SessionStatus,
        reason: Option<&str>,
        at: Timestamp,
    ) -> Result<bool> {
        let from = escalatable_from(target);
        let sql = format!(
            "UPDATE site_sessions SET \
                status = CASE WHEN status IN ({}) THEN ? ELSE status END, \
                metadata = json_set(metadata, '$.lastErrorReason', ?, '$.lastErrorAt', ?), \
                last_error_at = ?, updated_at = ? \
             WHERE user_id = ? AND site = ? AND domain = ?",
            placeholders(from.len())
        );

        let mut query = sqlx::query(&sql);
        for status in from {
            query = query.bind(status);
        }
        let at = at.to_rfc3339();
        let result = query
            .bind(target.as_str())
            .bind(reason)
            .bind(&at)
            .bind(&at)
            .bind(&at)
            .bind(key.user_id.as_str())
            .bind(key.site.as_str())
            .bind(&key.domain)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_used(&self, key: &SessionKey, at: Timestamp) -> Result<()> {
        sqlx::query(
            "UPDATE site_sessions SET last_used_at = ? \
             WHERE user_id = ? AND site = ? AND domain = ?",
        )
        .bind(at.to_rfc3339())
        .bind(key.user_id.as_str())
        .bind(key.site.as_str())
        .bind(&key.domain)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn replace_blob(&self, key: &SessionKey, blob: &str, key_version: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE site_sessions SET encrypted_blob = ?, key_version = ?, updated_at = ? \
             WHERE user_id = ? AND site = ? AND domain = ?",
        )
        .bind(blob)
        .bind(i64::from(key_version))
        .bind(Timestamp::now().to_rfc3339())
        .bind(key.user_id.as_str())
        .bind(key.site.as_str())
        .bind(&key.domain)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM site_sessions WHERE user_id = ? AND site = ? AND domain = ?")
                .bind(key.user_id.as_str())
                .bind(key.site.as_str())
                .bind(&key.domain)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<SessionRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY site, domain"
        ))
        .bind(user_id.as_str())
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> Database {
        let db = Database::new(":memory:", 1).await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    fn key(user: &str, site: Site) -> SessionKey {
        SessionKey::primary(UserId::new(user).expect("valid user id"), site)
    }

    fn new_session(key: SessionKey, blob: &str) -> NewSession {
        NewSession {
            key,
            encrypted_blob: blob.to_string(),
            key_version: 1,
            account_label: Some("main".to_string()),
            metadata: SessionMetadata {
                cookie_count: 1,
                origin_count: 0,
                domains: vec!["mercadolivre.com.br".to_string()],
                uploaded_at: Some(Timestamp::now()),
                ..SessionMetadata::default()
            },
            expires_at: Timestamp::now()
                .plus(chrono::Duration::days(30))
                .expect("expiry in range"),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let db = setup_test_db().await;
        let k = key("u1", Site::MercadoLivre);

        let record = db
            .upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert session");

        assert_eq!(record.status, SessionStatus::Active);
        assert_eq!(record.domain, "mercadolivre.com.br");
        assert_eq!(record.encrypted_blob, "aa:bb:cc");
        assert_eq!(record.metadata.cookie_count, 1);

        let found = db.find(&k).await.expect("find session").expect("row exists");
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let db = setup_test_db().await;
        let k = key("u1", Site::Olx);

        let first = db
            .upsert(new_session(k.clone(), "01:02:03"))
            .await
            .expect("first upload");
        db.escalate_status(&k, SessionStatus::Invalid)
            .await
            .expect("invalidate");

        let mut second_upload = new_session(k.clone(), "04:05:06");
        second_upload.account_label = None;
        let second = db.upsert(second_upload).await.expect("second upload");

        assert_eq!(second.id, first.id);
        assert_eq!(second.status, SessionStatus::Active);
        assert_eq!(second.encrypted_blob, "04:05:06");
        assert_eq!(second.account_label.as_deref(), Some("main"));
        assert!(second.last_error_at.is_none());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM site_sessions")
            .fetch_one(db.pool())
            .await
            .expect("count rows");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_escalate_never_lowers_severity() {
        let db = setup_test_db().await;
        let k = key("u1", Site::Superbid);
        db.upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert");

        assert_eq!(
            db.escalate_status(&k, SessionStatus::Invalid)
                .await
                .expect("escalate"),
            1
        );
        assert_eq!(
            db.escalate_status(&k, SessionStatus::Expired)
                .await
                .expect("escalate"),
            0
        );

        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.status, SessionStatus::Invalid);
    }

    #[tokio::test]
    async fn test_escalate_missing_row() {
        let db = setup_test_db().await;
        let affected = db
            .escalate_status(&key("nobody", Site::Olx), SessionStatus::Expired)
            .await
            .expect("escalate");
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_record_error_keeps_worse_status() {
        let db = setup_test_db().await;
        let k = key("u1", Site::VivaReal);
        db.upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert");
        db.escalate_status(&k, SessionStatus::Expired)
            .await
            .expect("expire");

        let updated = db
            .record_error(
                &k,
                SessionStatus::NeedsReauth,
                Some("login wall"),
                Timestamp::now(),
            )
            .await
            .expect("record error");
        assert!(updated);

        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.status, SessionStatus::Expired);
        assert_eq!(
            found.metadata.last_error_reason.as_deref(),
            Some("login wall")
        );
        assert!(found.last_error_at.is_some());
    }

    #[tokio::test]
    async fn test_record_error_keeps_upload_summary() {
        let db = setup_test_db().await;
        let k = key("u1", Site::MercadoLivre);
        db.upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert");

        let at = Timestamp::now();
        db.record_error(&k, SessionStatus::NeedsReauth, Some("checkpoint"), at)
            .await
            .expect("record error");

        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.status, SessionStatus::NeedsReauth);
        assert_eq!(found.metadata.cookie_count, 1);
        assert_eq!(found.metadata.domains, vec!["mercadolivre.com.br"]);
        assert!(found.metadata.uploaded_at.is_some());
        assert_eq!(found.metadata.last_error_reason.as_deref(), Some("checkpoint"));
        assert_eq!(found.metadata.last_error_at, Some(at));
    }

    #[tokio::test]
    async fn test_expire_if_past_checks_stored_expiry() {
        let db = setup_test_db().await;
        let k = key("u1", Site::Olx);
        let mut stale = new_session(k.clone(), "aa:bb:cc");
        stale.expires_at = Timestamp::now()
            .plus(chrono::Duration::seconds(-5))
            .expect("expiry in range");
        db.upsert(stale).await.expect("upsert stale");

        // Re-upload before the expiry write lands.
        db.upsert(new_session(k.clone(), "dd:ee:ff"))
            .await
            .expect("fresh upload");
        let affected = db
            .expire_if_past(&k, Timestamp::now())
            .await
            .expect("expire");
        assert_eq!(affected, 0);
        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.status, SessionStatus::Active);

        let later = Timestamp::now()
            .plus(chrono::Duration::days(31))
            .expect("time in range");
        let affected = db.expire_if_past(&k, later).await.expect("expire");
        assert_eq!(affected, 1);
        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.status, SessionStatus::Expired);
    }

    #[tokio::test]
    async fn test_invalidate_blob_ignores_replaced_payload() {
        let db = setup_test_db().await;
        let k = key("u1", Site::Superbid);
        db.upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert");
        db.upsert(new_session(k.clone(), "dd:ee:ff"))
            .await
            .expect("re-upload");

        assert_eq!(db.invalidate_blob(&k, "aa:bb:cc").await.expect("invalidate"), 0);
        assert_eq!(db.invalidate_blob(&k, "dd:ee:ff").await.expect("invalidate"), 1);
        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.status, SessionStatus::Invalid);
    }

    #[tokio::test]
    async fn test_record_error_missing_row() {
        let db = setup_test_db().await;
        let updated = db
            .record_error(
                &key("u1", Site::Olx),
                SessionStatus::NeedsReauth,
                None,
                Timestamp::now(),
            )
            .await
            .expect("record error");
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_replace_blob_and_touch() {
        let db = setup_test_db().await;
        let k = key("u1", Site::ZapImoveis);
        db.upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert");

        db.replace_blob(&k, "dd:ee:ff", 2).await.expect("replace");
        db.touch_last_used(&k, Timestamp::now())
            .await
            .expect("touch");

        let found = db.find(&k).await.expect("find").expect("row exists");
        assert_eq!(found.encrypted_blob, "dd:ee:ff");
        assert_eq!(found.key_version, 2);
        assert!(found.last_used_at.is_some());

        let missing = db
            .replace_blob(&key("u2", Site::ZapImoveis), "00:00:00", 2)
            .await;
        assert!(matches!(missing, Err(DatabaseError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let db = setup_test_db().await;
        let user = UserId::new("u1").expect("valid user id");
        for site in [Site::Olx, Site::MercadoLivre] {
            db.upsert(new_session(SessionKey::primary(user.clone(), site), "aa:bb:cc"))
                .await
                .expect("upsert");
        }
        db.upsert(new_session(key("u2", Site::Olx), "aa:bb:cc"))
            .await
            .expect("upsert other user");

        let listed = db.list_for_user(&user).await.expect("list");
        let sites: Vec<Site> = listed.iter().map(|r| r.site).collect();
        assert_eq!(sites, vec![Site::MercadoLivre, Site::Olx]);

        assert!(db
            .delete(&SessionKey::primary(user.clone(), Site::Olx))
            .await
            .expect("delete"));
        assert!(!db
            .delete(&SessionKey::primary(user.clone(), Site::Olx))
            .await
            .expect("second delete"));
        assert_eq!(db.list_for_user(&user).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_status_is_decode_error() {
        let db = setup_test_db().await;
        let k = key("u1", Site::Olx);
        db.upsert(new_session(k.clone(), "aa:bb:cc"))
            .await
            .expect("upsert");

        sqlx::query("UPDATE site_sessions SET site = 'EBAY'")
            .execute(db.pool())
            .await
            .expect("corrupt row");

        let listed = db.list_for_user(&k.user_id).await;
        assert!(matches!(listed, Err(DatabaseError::Decode(_))));
    }
}
