//! Ordered credential fallback.
//!
//! Sources are tried strictly one after another. The first credential that
//! also opens a browser wins; failures along the way are logged and skipped.
//! When nothing works, sites that tolerate it are crawled anonymously.

use crate::context::AuthContext;
use crate::credential::CredentialSource;
use crate::error::{AuthError, Result};
use crate::sources::{
    EnvCredentialSource, SecretFileSource, SessionManager, SessionManagerSource,
    SessionStoreSource,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vigia_browser::{BrowserLauncher, LaunchRequest};
use vigia_core::{CredentialConfig, CredentialSourceKind, Site, UserId};
use vigia_sites::{AuthMode, SiteRegistry};
use vigia_vault::SessionStore;

/// Resolves a browsing context for a crawl job.
#[derive(Clone)]
pub struct CredentialCascade {
    sources: Vec<Arc<dyn CredentialSource>>,
    manager: Arc<SessionManager>,
    registry: Arc<SiteRegistry>,
    launcher: Arc<dyn BrowserLauncher>,
    store: Option<SessionStore>,
}

impl std::fmt::Debug for CredentialCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCascade")
            .field("order", &self.order())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`CredentialCascade`].
pub struct CredentialCascadeBuilder {
    sources: Vec<Arc<dyn CredentialSource>>,
    manager: Arc<SessionManager>,
    registry: Arc<SiteRegistry>,
    launcher: Arc<dyn BrowserLauncher>,
    store: Option<SessionStore>,
}

impl CredentialCascadeBuilder {
    /// Append a source; sources are tried in the order they are added.
    #[must_use]
    pub fn source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Session store flagged when a login wall is reported.
    #[must_use]
    pub fn store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> CredentialCascade {
        CredentialCascade {
            sources: self.sources,
            manager: self.manager,
            registry: self.registry,
            launcher: self.launcher,
            store: self.store,
        }
    }
}

impl CredentialCascade {
    /// Start a cascade with no sources.
    #[must_use]
    pub fn builder(
        registry: Arc<SiteRegistry>,
        launcher: Arc<dyn BrowserLauncher>,
        manager: Arc<SessionManager>,
    ) -> CredentialCascadeBuilder {
        CredentialCascadeBuilder {
            sources: Vec::new(),
            manager,
            registry,
            launcher,
            store: None,
        }
    }

    /// Cascade with the built-in sources in the configured order.
    ///
    /// `secret_file` is skipped when no secret directory is configured.
    pub fn from_config(
        config: &CredentialConfig,
        default_secret_dir: Option<PathBuf>,
        store: SessionStore,
        registry: Arc<SiteRegistry>,
        launcher: Arc<dyn BrowserLauncher>,
        manager: Arc<SessionManager>,
    ) -> Self {
        let mut builder = Self::builder(registry, launcher, Arc::clone(&manager)).store(store.clone());

        for kind in &config.order {
            builder = match kind {
                CredentialSourceKind::Db => {
                    builder.source(Arc::new(SessionStoreSource::new(store.clone())))
                }
                CredentialSourceKind::SecretFile => {
                    match config.secret_dir.clone().or_else(|| default_secret_dir.clone()) {
                        Some(dir) => builder.source(Arc::new(SecretFileSource::new(dir))),
                        None => {
                            debug!("no secret directory configured; secret_file source disabled");
                            builder
                        }
                    }
                }
                CredentialSourceKind::Env => {
                    builder.source(Arc::new(EnvCredentialSource::from_env(&config.env_prefix)))
                }
                CredentialSourceKind::SessionManager => {
                    builder.source(Arc::new(SessionManagerSource::new(Arc::clone(&manager))))
                }
                // Anonymous is the implicit last resort, never a listed source.
                CredentialSourceKind::Anonymous => builder,
            };
        }

        builder.build()
    }

    /// Source kinds in the order they are tried.
    #[must_use]
    pub fn order(&self) -> Vec<CredentialSourceKind> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    /// Shared credential cache.
    #[must_use]
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Resolve a browsing context for `user_id` on `site`.
    ///
    /// # Errors
    /// - `UnsupportedSite` / `Validation` for bad identifiers
    /// - `CredentialExhausted` when no source works and the site requires cookies
    /// - `Browser` when even the anonymous session cannot be launched
    pub async fn resolve(&self, user_id: &str, site: &str) -> Result<AuthContext> {
        let site: Site = site.parse()?;
        let user_id = UserId::new(user_id)?;
        let config = self.registry.get(site)?;

        if config.auth_mode == AuthMode::Anonymous {
            debug!(user_id = %user_id, site = %site, "site is crawled anonymously");
            return self.anonymous(user_id, site).await;
        }

        for source in &self.sources {
            let kind = source.kind();
            let credential = match source.try_resolve(&user_id, site).await {
                Ok(Some(credential)) => credential,
                Ok(None) => {
                    debug!(user_id = %user_id, site = %site, source = %kind, "no credential from source");
                    continue;
                }
                Err(e) => {
                    warn!(user_id = %user_id, site = %site, source = %kind, error = %e, "credential source failed");
                    continue;
                }
            };

            let request = match LaunchRequest::with_storage_state(config, credential.state.as_value()) {
                Ok(request) => request,
                Err(e) => {
                    warn!(user_id = %user_id, site = %site, source = %kind, error = %e, "credential rejected by browser");
                    continue;
                }
            };

            let session = match self.launcher.launch(request).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(user_id = %user_id, site = %site, source = %kind, error = %e, "browser launch failed");
                    continue;
                }
            };

            if kind != CredentialSourceKind::SessionManager {
                self.manager
                    .store(&user_id, site, credential.state.clone())
                    .await;
            }

            info!(user_id = %user_id, site = %site, source = %kind, "credential resolved");
            return Ok(AuthContext::new(
                user_id,
                site,
                kind,
                credential.session_id,
                session,
            ));
        }

        if config.auth_mode.allows_anonymous() {
            info!(user_id = %user_id, site = %site, "no credential found; falling back to anonymous");
            return self.anonymous(user_id, site).await;
        }

        let tried: Vec<&str> = self.sources.iter().map(|s| s.kind().as_str()).collect();
        warn!(user_id = %user_id, site = %site, "credential cascade exhausted");
        Err(AuthError::CredentialExhausted {
            site,
            tried: tried.join(", "),
        })
    }

    async fn anonymous(&self, user_id: UserId, site: Site) -> Result<AuthContext> {
        let config = self.registry.get(site)?;
        let session = self.launcher.launch(LaunchRequest::anonymous(config)).await?;
        Ok(AuthContext::new(
            user_id,
            site,
            CredentialSourceKind::Anonymous,
            None,
            session,
        ))
    }

    /// The crawler hit a login wall: flag the stored session and drop the
    /// cached credential. Returns whether a stored session was flagged.
    pub async fn report_login_wall(
        &self,
        user_id: &str,
        site: &str,
        reason: Option<&str>,
    ) -> Result<bool> {
        let parsed_site: Site = site.parse()?;
        let parsed_user = UserId::new(user_id)?;

        self.manager.evict(&parsed_user, parsed_site).await;

        let flagged = match &self.store {
            Some(store) => store.mark_needs_reauth(user_id, site, reason).await?,
            None => false,
        };

        info!(user_id = %parsed_user, site = %parsed_site, flagged, "login wall reported");
        Ok(flagged)
    }
}
