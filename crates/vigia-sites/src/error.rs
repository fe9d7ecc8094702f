//! Error types for the site configuration subsystem.

use thiserror::Error;
use vigia_core::Site;

/// Errors that can occur in site registry operations.
#[derive(Error, Debug)]
pub enum SiteError {
    /// Identifier is not one of the supported marketplaces
    #[error("unsupported site '{site}', expected one of: {supported}")]
    UnsupportedSite {
        /// The identifier that was rejected
        site: String,
        /// Comma-separated list of valid identifiers
        supported: String,
    },

    /// Site is supported but no configuration was registered for it
    #[error("no configuration registered for {site}")]
    NotRegistered {
        /// The site that was looked up
        site: Site,
    },

    /// A configuration for this site was already registered
    #[error("configuration for {site} registered twice")]
    DuplicateSite {
        /// The site registered twice
        site: Site,
    },

    /// Invalid site configuration (validation failed)
    #[error("invalid configuration for {site}: {reason}")]
    ValidationError {
        /// Site being validated
        site: Site,
        /// Reason for validation failure
        reason: String,
    },
}

impl SiteError {
    /// Rejection of an unknown site identifier, listing the valid ones.
    #[must_use]
    pub fn unsupported(site: &str) -> Self {
        Self::UnsupportedSite {
            site: site.to_string(),
            supported: Site::supported_list(),
        }
    }
}

/// Result type for site operations.
pub type Result<T> = std::result::Result<T, SiteError>;
