//! Error types for the vault module.

use thiserror::Error;
use vigia_core::{Site, Timestamp, VigiaError};

/// Why a sealed blob could not be opened.
///
/// Callers treat every variant as one decrypt error; the sub-cause exists
/// for logs and operator inspection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptFailure {
    /// Blob is not three hex segments of the expected lengths.
    #[error("malformed blob: {0}")]
    MalformedBlob(String),

    /// Authentication failed (tampered data or wrong key).
    #[error("authentication tag mismatch")]
    TagMismatch,

    /// Any other cipher failure, such as a missing key version.
    #[error("cipher failure: {0}")]
    Cipher(String),
}

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Site identifier is not one of the supported marketplaces.
    #[error("unsupported site '{site}', expected one of: {supported}")]
    UnsupportedSite {
        /// The identifier that was rejected
        site: String,
        /// Comma-separated list of valid identifiers
        supported: String,
    },

    /// Input other than the site failed validation (e.g. a malformed user id).
    #[error("validation error: {0}")]
    Validation(String),

    /// Uploaded payload is not an object with `cookies` and `origins` arrays.
    #[error("invalid payload shape: {0}")]
    InvalidPayloadShape(String),

    /// Stored blob could not be decrypted. The row is left untouched.
    #[error("decrypt error: {0}")]
    Decryption(#[from] DecryptFailure),

    /// Session was flagged by a login wall and needs a fresh upload.
    #[error("session for {site} needs re-authentication")]
    SessionNeedsReauth {
        /// Site of the session
        site: Site,
    },

    /// Session status is already `EXPIRED`.
    #[error("session for {site} is expired")]
    SessionExpiredByStatus {
        /// Site of the session
        site: Site,
    },

    /// Session passed its expiry date; status has been set to `EXPIRED`.
    #[error("session for {site} expired at {expired_at}")]
    SessionExpiredByTime {
        /// Site of the session
        site: Site,
        /// Stored expiry time
        expired_at: Timestamp,
    },

    /// Session payload no longer has the expected structure.
    #[error("session for {site} is invalid")]
    SessionInvalid {
        /// Site of the session
        site: Site,
    },

    /// No session stored for this user and site.
    #[error("no session stored for {site}")]
    SessionNotFound {
        /// Site that was looked up
        site: Site,
    },

    /// Encryption operation failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// No usable key material was configured.
    #[error("session key unavailable: {0}")]
    KeyUnavailable(String),

    /// Failed to derive key from passphrase.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] vigia_db::DatabaseError),
}

impl From<VigiaError> for VaultError {
    fn from(err: VigiaError) -> Self {
        match err {
            VigiaError::UnsupportedSite { site, supported } => {
                Self::UnsupportedSite { site, supported }
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
