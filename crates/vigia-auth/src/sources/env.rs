//! Base64 storage states passed through environment variables.

use crate::credential::{Credential, CredentialSource};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use vigia_core::{CredentialSourceKind, Site, UserId};
use vigia_vault::StorageState;
use zeroize::Zeroizing;

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads `<PREFIX>_<SITE>`, then `<PREFIX>`.
#[derive(Clone)]
pub struct EnvCredentialSource {
    prefix: String,
    lookup: Lookup,
}

impl fmt::Debug for EnvCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentialSource")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl EnvCredentialSource {
    /// Source backed by the process environment.
    pub fn from_env(prefix: impl Into<String>) -> Self {
        Self::with_lookup(prefix, |name| std::env::var(name).ok())
    }

    /// Source backed by a fixed set of variables.
    pub fn from_values(prefix: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self::with_lookup(prefix, move |name| values.get(name).cloned())
    }

    /// Source backed by an arbitrary lookup.
    pub fn with_lookup(
        prefix: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            lookup: Arc::new(lookup),
        }
    }

    /// Variable names for a site, most specific first.
    #[must_use]
    pub fn variable_names(&self, site: Site) -> [String; 2] {
        [format!("{}_{}", self.prefix, site.as_str()), self.prefix.clone()]
    }

    fn decode(name: &str, encoded: &str) -> Result<StorageState> {
        let failure = |reason: String| {
            AuthError::source_failure(CredentialSourceKind::Env, format!("{name}: {reason}"))
        };

        let bytes = Zeroizing::new(
            Base64::decode_vec(encoded.trim()).map_err(|_| failure("not valid base64".to_string()))?,
        );
        StorageState::from_slice(&bytes).map_err(|e| failure(e.to_string()))
    }
}

#[async_trait]
impl CredentialSource for EnvCredentialSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::Env
    }

    async fn try_resolve(&self, _user_id: &UserId, site: Site) -> Result<Option<Credential>> {
        for name in self.variable_names(site) {
            let Some(encoded) = (self.lookup)(&name).map(Zeroizing::new) else {
                continue;
            };
            match Self::decode(&name, &encoded) {
                Ok(state) => {
                    debug!(site = %site, variable = %name, "storage state read from environment");
                    return Ok(Some(Credential::new(CredentialSourceKind::Env, state)));
                }
                Err(e) => warn!(site = %site, error = %e, "skipping environment storage state"),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1").expect("valid user")
    }

    fn encode(json: &str) -> String {
        Base64::encode_string(json.as_bytes())
    }

    fn source(values: &[(&str, String)]) -> EnvCredentialSource {
        EnvCredentialSource::from_values(
            "VIGIA_STORAGE_STATE",
            values
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_site_variable_wins() {
        let source = source(&[
            (
                "VIGIA_STORAGE_STATE_OLX",
                encode(r#"{"cookies": [{"domain": "olx.com.br"}], "origins": []}"#),
            ),
            ("VIGIA_STORAGE_STATE", encode(r#"{"cookies": [], "origins": []}"#)),
        ]);

        let credential = source
            .try_resolve(&user(), Site::Olx)
            .await
            .expect("resolve")
            .expect("credential");
        assert_eq!(credential.source, CredentialSourceKind::Env);
        assert_eq!(credential.state.summary().cookie_count, 1);
    }

    #[tokio::test]
    async fn test_generic_variable_fallback() {
        let source = source(&[("VIGIA_STORAGE_STATE", encode(r#"{"cookies": [], "origins": []}"#))]);
        assert!(source
            .try_resolve(&user(), Site::Superbid)
            .await
            .expect("resolve")
            .is_some());
    }

    #[tokio::test]
    async fn test_malformed_values_are_rejected() {
        let source = source(&[
            ("VIGIA_STORAGE_STATE_OLX", "%%% not base64".to_string()),
            ("VIGIA_STORAGE_STATE", encode(r#"{"cookies": []}"#)),
        ]);
        assert!(source
            .try_resolve(&user(), Site::Olx)
            .await
            .expect("resolve")
            .is_none());

        assert!(EnvCredentialSource::decode("X", &encode("[1, 2]")).is_err());
    }

    #[tokio::test]
    async fn test_nothing_set() {
        assert!(source(&[])
            .try_resolve(&user(), Site::Olx)
            .await
            .expect("resolve")
            .is_none());
    }
}
