//! Storage states provisioned as files by the host.

use crate::credential::{Credential, CredentialSource};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vigia_core::{CredentialSourceKind, Site, UserId};
use vigia_vault::StorageState;
use zeroize::Zeroizing;

/// Shared file consulted when no site-specific file exists.
pub const SHARED_FILE_NAME: &str = "storage-state.json";

/// Reads `<dir>/<SITE>.json`, then `<dir>/storage-state.json`.
#[derive(Debug, Clone)]
pub struct SecretFileSource {
    dir: PathBuf,
}

impl SecretFileSource {
    /// Source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Candidate files for a site, most specific first.
    #[must_use]
    pub fn candidates(&self, site: Site) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.json", site.as_str())),
            self.dir.join(SHARED_FILE_NAME),
        ]
    }

    async fn read(path: &Path) -> Result<Option<StorageState>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::source_failure(
                    CredentialSourceKind::SecretFile,
                    format!("cannot read {}: {e}", path.display()),
                ))
            }
        };

        StorageState::from_slice(&bytes).map(Some).map_err(|e| {
            AuthError::source_failure(
                CredentialSourceKind::SecretFile,
                format!("{}: {e}", path.display()),
            )
        })
    }
}

#[async_trait]
impl CredentialSource for SecretFileSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::SecretFile
    }

    async fn try_resolve(&self, _user_id: &UserId, site: Site) -> Result<Option<Credential>> {
        for path in self.candidates(site) {
            match Self::read(&path).await {
                Ok(Some(state)) => {
                    debug!(site = %site, path = %path.display(), "storage state read from secret file");
                    return Ok(Some(Credential::new(CredentialSourceKind::SecretFile, state)));
                }
                Ok(None) => {}
                Err(e) => warn!(site = %site, error = %e, "skipping secret file"),
            }
        }
        Ok(None)
    }
}
