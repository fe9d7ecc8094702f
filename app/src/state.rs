//! Application state management.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use vigia_auth::{CredentialCascade, SessionManager};
use vigia_browser::{BrowserLauncher, ChromiumLauncher, RateLimiter};
use vigia_core::AppConfig;
use vigia_db::Database;
use vigia_sites::SiteRegistry;
use vigia_vault::{Keyring, SessionStore};

/// Shared state behind every command and crawl callback.
#[derive(Debug)]
pub struct AppState {
    /// Effective configuration
    pub config: AppConfig,
    /// Open database
    pub db: Database,
    /// Encrypted session store
    pub store: SessionStore,
    /// Immutable site configurations
    pub registry: Arc<SiteRegistry>,
    /// Per-site request pacing
    pub rate_limiter: Arc<RateLimiter>,
    /// Credential resolution for crawl jobs
    pub cascade: CredentialCascade,
}

impl AppState {
    /// Open the database, load key material and wire the production launcher.
    pub async fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = AppConfig::data_dir().context("failed to determine data directory")?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let db_path = config.database_path()?;
        info!("Database: {}", db_path.display());
        let db = Database::open_and_migrate(&db_path, config.database.max_connections)
            .await
            .context("failed to open session database")?;

        let keyring = Keyring::from_config(&config.vault, &data_dir.join(".session_salt"), |name| {
            std::env::var(name).ok()
        })
        .context("failed to load session keys")?;

        let registry = SiteRegistry::builtin().context("invalid built-in site configuration")?;
        let launcher: Arc<dyn BrowserLauncher> =
            Arc::new(ChromiumLauncher::new(config.browser.clone()));

        Ok(Self::assemble(
            config,
            db,
            keyring,
            registry,
            launcher,
            Some(data_dir.join("secrets")),
        ))
    }

    /// Wire already-opened parts together.
    ///
    /// `default_secret_dir` is used when `credentials.secret_dir` is unset.
    #[must_use]
    pub fn assemble(
        config: AppConfig,
        db: Database,
        keyring: Keyring,
        registry: SiteRegistry,
        launcher: Arc<dyn BrowserLauncher>,
        default_secret_dir: Option<PathBuf>,
    ) -> Self {
        let store = SessionStore::new(Arc::new(db.clone()), keyring, config.sessions.ttl_days);
        let registry = Arc::new(registry);
        let rate_limiter = Arc::new(RateLimiter::from_registry(&registry));
        let manager = Arc::new(SessionManager::new(Duration::from_secs(
            config.credentials.session_manager_ttl_minutes.saturating_mul(60),
        )));

        let cascade = CredentialCascade::from_config(
            &config.credentials,
            default_secret_dir,
            store.clone(),
            Arc::clone(&registry),
            launcher,
            manager,
        );

        info!(
            sites = registry.count(),
            order = ?cascade.order(),
            "Application state ready"
        );

        Self {
            config,
            db,
            store,
            registry,
            rate_limiter,
            cascade,
        }
    }

    /// Close the database.
    pub async fn shutdown(self) {
        self.db.close().await;
        info!("Application state closed");
    }
}
