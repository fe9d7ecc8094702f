//! Error type returned by exposed commands.

use serde::Serialize;
use serde_json::json;
use vigia_auth::AuthError;
use vigia_browser::BrowserError;
use vigia_sites::SiteError;
use vigia_vault::VaultError;

/// Serializable error for the command surface.
#[derive(Debug, Serialize)]
pub struct CommandError {
    /// Error code for caller handling (e.g., "SESSION_NEEDS_REAUTH")
    pub code: String,
    /// User-friendly error message
    pub message: String,
    /// Optional debugging context (never contains credential material)
    pub details: Option<serde_json::Value>,
}

impl CommandError {
    /// Create a new command error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a command error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<VaultError> for CommandError {
    fn from(err: VaultError) -> Self {
        let message = err.to_string();
        match err {
            VaultError::UnsupportedSite { site, supported } => Self::with_details(
                "UNSUPPORTED_SITE",
                message,
                json!({ "site": site, "supported": supported }),
            ),
            VaultError::Validation(_) => Self::new("VALIDATION_ERROR", message),
            VaultError::InvalidPayloadShape(_) => Self::new("INVALID_PAYLOAD", message),
            // The sub-cause stays in the logs.
            VaultError::Decryption(_) => {
                Self::new("DECRYPTION_FAILED", "Stored session could not be decrypted")
            }
            VaultError::SessionNeedsReauth { site } => Self::with_details(
                "SESSION_NEEDS_REAUTH",
                message,
                json!({ "site": site }),
            ),
            VaultError::SessionExpiredByStatus { site } => {
                Self::with_details("SESSION_EXPIRED", message, json!({ "site": site }))
            }
            VaultError::SessionExpiredByTime { site, expired_at } => Self::with_details(
                "SESSION_EXPIRED",
                message,
                json!({ "site": site, "expiredAt": expired_at }),
            ),
            VaultError::SessionInvalid { site } => {
                Self::with_details("SESSION_INVALID", message, json!({ "site": site }))
            }
            VaultError::SessionNotFound { site } => {
                Self::with_details("SESSION_NOT_FOUND", message, json!({ "site": site }))
            }
            VaultError::Encryption(_) => Self::new("ENCRYPTION_FAILED", message),
            VaultError::KeyUnavailable(_) => Self::new("KEY_UNAVAILABLE", message),
            VaultError::KeyDerivation(_) => Self::new("KEY_DERIVATION_FAILED", message),
            VaultError::Database(_) => Self::new("DATABASE_ERROR", message),
        }
    }
}

impl From<SiteError> for CommandError {
    fn from(err: SiteError) -> Self {
        let message = err.to_string();
        match err {
            SiteError::UnsupportedSite { site, supported } => Self::with_details(
                "UNSUPPORTED_SITE",
                message,
                json!({ "site": site, "supported": supported }),
            ),
            SiteError::NotRegistered { site } => {
                Self::with_details("SITE_NOT_REGISTERED", message, json!({ "site": site }))
            }
            SiteError::DuplicateSite { .. } | SiteError::ValidationError { .. } => {
                Self::new("SITE_CONFIG_ERROR", message)
            }
        }
    }
}

impl From<BrowserError> for CommandError {
    fn from(err: BrowserError) -> Self {
        let message = err.to_string();
        match err {
            BrowserError::RateLimitTimeout { site, waited } => Self::with_details(
                "RATE_LIMITED",
                message,
                json!({ "site": site, "waitedMs": u64::try_from(waited.as_millis()).unwrap_or(u64::MAX) }),
            ),
            BrowserError::Cancelled { site } => {
                Self::with_details("CANCELLED", message, json!({ "site": site }))
            }
            BrowserError::UnknownSite { site } => {
                Self::with_details("SITE_NOT_REGISTERED", message, json!({ "site": site }))
            }
            BrowserError::InvalidStorageState(_) => Self::new("INVALID_PAYLOAD", message),
            BrowserError::Timeout(_) => Self::new("BROWSER_TIMEOUT", message),
            BrowserError::Launch(_) | BrowserError::Chromium(_) | BrowserError::Navigation(_) => {
                Self::new("BROWSER_ERROR", message)
            }
        }
    }
}

impl From<AuthError> for CommandError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::CredentialExhausted { site, tried } => Self::with_details(
                "CREDENTIAL_EXHAUSTED",
                format!("No usable credential for {site}"),
                json!({ "site": site, "tried": tried }),
            ),
            AuthError::UnsupportedSite { site, supported } => Self::with_details(
                "UNSUPPORTED_SITE",
                format!("Unsupported site '{site}'"),
                json!({ "site": site, "supported": supported }),
            ),
            AuthError::Validation(msg) => Self::new("VALIDATION_ERROR", msg),
            AuthError::Source {
                source_kind,
                message,
            } => Self::with_details(
                "CREDENTIAL_SOURCE_FAILED",
                message,
                json!({ "source": source_kind }),
            ),
            AuthError::Site(err) => err.into(),
            AuthError::Store(err) => err.into(),
            AuthError::Browser(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vigia_core::{CredentialSourceKind, Site};
    use vigia_vault::DecryptFailure;

    #[test]
    fn test_command_error_new() {
        let err = CommandError::new("TEST_CODE", "Test message");
        assert_eq!(err.code, "TEST_CODE");
        assert_eq!(err.message, "Test message");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_command_error_with_details() {
        let details = json!({ "key": "value" });
        let err = CommandError::with_details("TEST_CODE", "Test message", details.clone());
        assert_eq!(err.code, "TEST_CODE");
        assert_eq!(err.details, Some(details));
    }

    #[test]
    fn test_needs_reauth_conversion() {
        let err: CommandError = VaultError::SessionNeedsReauth { site: Site::Olx }.into();
        assert_eq!(err.code, "SESSION_NEEDS_REAUTH");
        assert_eq!(err.details, Some(json!({ "site": "OLX" })));
    }

    #[test]
    fn test_decryption_hides_cause() {
        let err: CommandError = VaultError::Decryption(DecryptFailure::TagMismatch).into();
        assert_eq!(err.code, "DECRYPTION_FAILED");
        assert!(!err.message.contains("tag"));
    }

    #[test]
    fn test_unsupported_site_lists_supported() {
        let err: CommandError = SiteError::unsupported("EBAY").into();
        assert_eq!(err.code, "UNSUPPORTED_SITE");
        let details = err.details.expect("details");
        assert_eq!(details["site"], "EBAY");
        assert!(details["supported"]
            .as_str()
            .expect("supported list")
            .contains("OLX"));
    }

    #[test]
    fn test_rate_limit_conversion() {
        let err: CommandError = BrowserError::RateLimitTimeout {
            site: Site::FacebookMarketplace,
            waited: Duration::from_millis(1500),
        }
        .into();
        assert_eq!(err.code, "RATE_LIMITED");
        assert_eq!(err.details.expect("details")["waitedMs"], 1500);
    }

    #[test]
    fn test_auth_errors_unwrap_nested() {
        let err: CommandError = AuthError::Store(VaultError::SessionNotFound { site: Site::Olx }).into();
        assert_eq!(err.code, "SESSION_NOT_FOUND");

        let err: CommandError = AuthError::CredentialExhausted {
            site: Site::FacebookMarketplace,
            tried: "db, env".to_string(),
        }
        .into();
        assert_eq!(err.code, "CREDENTIAL_EXHAUSTED");

        let err: CommandError =
            AuthError::source_failure(CredentialSourceKind::Env, "bad base64").into();
        assert_eq!(err.code, "CREDENTIAL_SOURCE_FAILED");
        assert_eq!(err.details, Some(json!({ "source": "env" })));
    }

    #[test]
    fn test_serialization() {
        let err = CommandError::new("SESSION_NOT_FOUND", "no session stored for OLX");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["code"], "SESSION_NOT_FOUND");
        assert!(value["details"].is_null());
    }
}
