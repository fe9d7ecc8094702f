//! Shared types used across the Vigia crawler core.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use crate::error::VigiaError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Supported external marketplaces.
///
/// The wire form (database column, API payloads) is `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Site {
    /// Flagship general marketplace
    MercadoLivre,
    /// Social network marketplace
    FacebookMarketplace,
    /// Classifieds
    Olx,
    /// Real estate listings
    ZapImoveis,
    /// Real estate listings
    VivaReal,
    /// Real estate listings
    #[serde(rename = "IMOVELWEB")]
    ImovelWeb,
    /// Online auctions
    Superbid,
    /// Vehicle and property auctions
    SodreSantoro,
    /// Judicial and extrajudicial auctions
    MegaLeiloes,
}

impl Site {
    /// Every supported site, in declaration order.
    pub const ALL: [Site; 9] = [
        Self::MercadoLivre,
        Self::FacebookMarketplace,
        Self::Olx,
        Self::ZapImoveis,
        Self::VivaReal,
        Self::ImovelWeb,
        Self::Superbid,
        Self::SodreSantoro,
        Self::MegaLeiloes,
    ];

    /// Wire identifier (e.g. `MERCADO_LIVRE`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MercadoLivre => "MERCADO_LIVRE",
            Self::FacebookMarketplace => "FACEBOOK_MARKETPLACE",
            Self::Olx => "OLX",
            Self::ZapImoveis => "ZAP_IMOVEIS",
            Self::VivaReal => "VIVA_REAL",
            Self::ImovelWeb => "IMOVELWEB",
            Self::Superbid => "SUPERBID",
            Self::SodreSantoro => "SODRE_SANTORO",
            Self::MegaLeiloes => "MEGA_LEILOES",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MercadoLivre => "Mercado Livre",
            Self::FacebookMarketplace => "Facebook Marketplace",
            Self::Olx => "OLX",
            Self::ZapImoveis => "ZAP Imóveis",
            Self::VivaReal => "Viva Real",
            Self::ImovelWeb => "Imovelweb",
            Self::Superbid => "Superbid",
            Self::SodreSantoro => "Sodré Santoro",
            Self::MegaLeiloes => "Mega Leilões",
        }
    }

    /// Ordered domain list. The first entry is the primary domain used in
    /// the session natural key.
    #[must_use]
    pub fn domains(&self) -> &'static [&'static str] {
        match self {
            Self::MercadoLivre => &["mercadolivre.com.br", "mercadolibre.com"],
            Self::FacebookMarketplace => &["facebook.com", "m.facebook.com"],
            Self::Olx => &["olx.com.br"],
            Self::ZapImoveis => &["zapimoveis.com.br"],
            Self::VivaReal => &["vivareal.com.br"],
            Self::ImovelWeb => &["imovelweb.com.br"],
            Self::Superbid => &["superbid.net", "exchange.superbid.net"],
            Self::SodreSantoro => &["sodresantoro.com.br"],
            Self::MegaLeiloes => &["megaleiloes.com.br"],
        }
    }

    /// Primary domain (first entry of [`Site::domains`]).
    #[must_use]
    pub fn primary_domain(&self) -> &'static str {
        self.domains()[0]
    }

    /// Comma-separated list of every supported wire identifier.
    #[must_use]
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(Site::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = VigiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|site| site.as_str() == s)
            .ok_or_else(|| VigiaError::UnsupportedSite {
                site: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Newtype for tenant user identifiers.
///
/// User IDs are opaque strings issued by the outer API layer: 1-128 characters
/// drawn from letters, digits and `._:@-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new `UserId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is empty, too long or contains other characters.
    pub fn new(id: impl Into<String>) -> Result<Self, VigiaError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), VigiaError> {
        static USER_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            USER_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9._:@-]{1,128}$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(VigiaError::Validation(format!(
                "invalid user ID: must be 1-128 characters of [A-Za-z0-9._:@-], got '{id}'"
            )))
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = VigiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Newtype for stored session identifiers (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new random `SessionId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an identifier read back from storage.
    #[must_use]
    pub fn from_stored(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag identifying which credential source produced a browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSourceKind {
    /// Encrypted per-user session from the session store
    Db,
    /// Statically provisioned secret file on the execution host
    SecretFile,
    /// Base64 storage state supplied through deployment configuration
    Env,
    /// In-memory cache of recently successful sessions
    SessionManager,
    /// No credential at all
    Anonymous,
}

impl CredentialSourceKind {
    /// Snake-case tag (e.g. `secret_file`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::SecretFile => "secret_file",
            Self::Env => "env",
            Self::SessionManager => "session_manager",
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for CredentialSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a stored session.
///
/// Variants are ordered by severity. Every event except [`SessionEvent::Uploaded`]
/// can only keep or raise the severity, so a session never silently returns to
/// `Active` without a fresh upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Usable credential
    Active,
    /// The crawl engine hit a login wall with this credential
    NeedsReauth,
    /// Past its expiry date, or expired explicitly
    Expired,
    /// Decrypted payload no longer has the expected structure
    Invalid,
}

/// Events that drive [`SessionStatus`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A valid credential payload was uploaded
    Uploaded,
    /// The crawl engine reported a login wall or checkpoint
    LoginWall,
    /// `expires_at` was observed in the past during a load
    TimeExpired,
    /// Expired explicitly by an operator or job
    MarkedExpired,
    /// Decryption succeeded but the payload failed structural validation
    CorruptPayload,
}

impl SessionStatus {
    /// Every status, from least to most severe.
    pub const ALL: [SessionStatus; 4] = [
        Self::Active,
        Self::NeedsReauth,
        Self::Expired,
        Self::Invalid,
    ];

    /// Wire identifier (e.g. `NEEDS_REAUTH`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::NeedsReauth => "NEEDS_REAUTH",
            Self::Expired => "EXPIRED",
            Self::Invalid => "INVALID",
        }
    }

    /// Compute the status that results from `event`.
    #[must_use]
    pub fn apply(self, event: SessionEvent) -> Self {
        let floor = match event {
            SessionEvent::Uploaded => return Self::Active,
            SessionEvent::LoginWall => Self::NeedsReauth,
            SessionEvent::TimeExpired | SessionEvent::MarkedExpired => Self::Expired,
            SessionEvent::CorruptPayload => Self::Invalid,
        };
        self.max(floor)
    }

    /// Whether a session in this status may be decrypted and used.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = VigiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "NEEDS_REAUTH" => Ok(Self::NeedsReauth),
            "EXPIRED" => Ok(Self::Expired),
            "INVALID" => Ok(Self::Invalid),
            other => Err(VigiaError::Validation(format!(
                "unknown session status '{other}'"
            ))),
        }
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, VigiaError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| VigiaError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Shift the timestamp by a signed duration.
    ///
    /// # Errors
    /// Returns `VigiaError::Validation` if the result is out of range.
    pub fn plus(&self, delta: chrono::Duration) -> Result<Self, VigiaError> {
        self.0
            .checked_add_signed(delta)
            .map(Self)
            .ok_or_else(|| {
                VigiaError::Validation(format!("timestamp {self} + {delta} out of range"))
            })
    }

    /// Whether this timestamp lies strictly before `other`.
    #[must_use]
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
