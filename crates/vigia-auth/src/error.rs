//! Error types for credential resolution.

use thiserror::Error;
use vigia_core::{CredentialSourceKind, Site, VigiaError};

/// Credential resolution errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Every configured source came up empty and the site refuses anonymous crawls
    #[error("no usable credential for {site} (tried: {tried})")]
    CredentialExhausted {
        /// Site being resolved
        site: Site,
        /// Comma-separated list of sources that were tried
        tried: String,
    },

    /// Site identifier is not one of the supported marketplaces
    #[error("unsupported site '{site}', expected one of: {supported}")]
    UnsupportedSite {
        /// The identifier that was rejected
        site: String,
        /// Comma-separated list of valid identifiers
        supported: String,
    },

    /// Malformed input other than the site
    #[error("validation error: {0}")]
    Validation(String),

    /// A credential source failed
    #[error("{source_kind} source failed: {message}")]
    Source {
        /// Which source failed
        source_kind: CredentialSourceKind,
        /// Failure description, never containing credential material
        message: String,
    },

    /// Site configuration lookup failed
    #[error(transparent)]
    Site(#[from] vigia_sites::SiteError),

    /// Session store operation failed
    #[error(transparent)]
    Store(#[from] vigia_vault::VaultError),

    /// Browser could not be launched or released
    #[error(transparent)]
    Browser(#[from] vigia_browser::BrowserError),
}

impl AuthError {
    /// Wrap a failure of `kind` without leaking its payload.
    pub fn source_failure(kind: CredentialSourceKind, message: impl Into<String>) -> Self {
        Self::Source {
            source_kind: kind,
            message: message.into(),
        }
    }
}

impl From<VigiaError> for AuthError {
    fn from(err: VigiaError) -> Self {
        match err {
            VigiaError::UnsupportedSite { site, supported } => {
                Self::UnsupportedSite { site, supported }
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Result type for credential resolution
pub type Result<T> = std::result::Result<T, AuthError>;
