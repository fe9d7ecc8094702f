//! Immutable site configuration registry.
//!
//! Configurations are registered once at boot through [`SiteRegistryBuilder`].
//! After [`build`](SiteRegistryBuilder::build) the registry is read-only and is
//! shared behind an `Arc` without locks.

use crate::{
    catalog,
    definition::SiteConfig,
    error::{Result, SiteError},
};
use std::collections::HashMap;
use tracing::{debug, info};
use vigia_core::Site;

/// Collects site configurations before the registry is frozen.
#[derive(Debug, Default)]
pub struct SiteRegistryBuilder {
    configs: Vec<SiteConfig>,
}

impl SiteRegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration.
    ///
    /// # Errors
    /// Returns `ValidationError` for an invalid configuration and
    /// `DuplicateSite` when the site is already registered.
    pub fn register(&mut self, config: SiteConfig) -> Result<&mut Self> {
        config.validate()?;

        if self.configs.iter().any(|existing| existing.site == config.site) {
            return Err(SiteError::DuplicateSite { site: config.site });
        }

        debug!(site = %config.site, "registered site configuration");
        self.configs.push(config);
        Ok(self)
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> SiteRegistry {
        let index = self
            .configs
            .iter()
            .enumerate()
            .map(|(position, config)| (config.site, position))
            .collect();

        info!(count = self.configs.len(), "site registry built");

        SiteRegistry {
            configs: self.configs,
            index,
        }
    }
}

/// Read-only lookup of site configurations.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    /// Configurations in registration order
    configs: Vec<SiteConfig>,
    /// Position of each site in `configs`
    index: HashMap<Site, usize>,
}

impl SiteRegistry {
    /// Start registering configurations.
    #[must_use]
    pub fn builder() -> SiteRegistryBuilder {
        SiteRegistryBuilder::new()
    }

    /// Registry holding the built-in configuration of every supported site.
    ///
    /// # Errors
    /// Returns an error if a built-in configuration fails validation.
    pub fn builtin() -> Result<Self> {
        let mut builder = SiteRegistryBuilder::new();
        for config in catalog::builtin_configs() {
            builder.register(config)?;
        }
        Ok(builder.build())
    }

    /// Configuration for a site.
    ///
    /// # Errors
    /// Returns `NotRegistered` if the site has no configuration.
    pub fn get(&self, site: Site) -> Result<&SiteConfig> {
        self.index
            .get(&site)
            .map(|&position| &self.configs[position])
            .ok_or(SiteError::NotRegistered { site })
    }

    /// Configuration for a wire identifier such as `MERCADO_LIVRE`.
    ///
    /// # Errors
    /// Returns `UnsupportedSite` for an unknown identifier, `NotRegistered`
    /// for a known site without configuration.
    pub fn get_by_name(&self, name: &str) -> Result<&SiteConfig> {
        let site: Site = name.parse().map_err(|_| SiteError::unsupported(name))?;
        self.get(site)
    }

    /// Registered sites in registration order.
    #[must_use]
    pub fn list_sites(&self) -> Vec<Site> {
        self.configs.iter().map(|config| config.site).collect()
    }

    /// Registered configurations in registration order.
    pub fn configs(&self) -> impl Iterator<Item = &SiteConfig> {
        self.configs.iter()
    }

    /// Number of registered sites.
    #[must_use]
    pub fn count(&self) -> usize {
        self.configs.len()
    }

    /// Check if a site is registered.
    #[must_use]
    pub fn contains(&self, site: Site) -> bool {
        self.index.contains_key(&site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::config_for;

    #[test]
    fn test_builder_empty() {
        let registry = SiteRegistryBuilder::new().build();
        assert_eq!(registry.count(), 0);
        assert!(registry.list_sites().is_empty());
    }

    #[test]
    fn test_register_and_get() {
        let mut builder = SiteRegistry::builder();
        builder.register(config_for(Site::Olx)).expect("register");
        let registry = builder.build();

        let config = registry.get(Site::Olx).expect("get OLX");
        assert_eq!(config.site, Site::Olx);
        assert!(registry.contains(Site::Olx));
    }

    #[test]
    fn test_get_unregistered() {
        let registry = SiteRegistryBuilder::new().build();
        assert!(matches!(
            registry.get(Site::Olx),
            Err(SiteError::NotRegistered { site: Site::Olx })
        ));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut builder = SiteRegistry::builder();
        builder.register(config_for(Site::Olx)).expect("first");

        let result = builder.register(config_for(Site::Olx));
        assert!(matches!(
            result,
            Err(SiteError::DuplicateSite { site: Site::Olx })
        ));
        assert_eq!(builder.build().count(), 1);
    }

    #[test]
    fn test_register_rejects_invalid_config() {
        let mut config = config_for(Site::Superbid);
        config.rate_limit.tokens_per_min = 0;

        let mut builder = SiteRegistry::builder();
        assert!(matches!(
            builder.register(config),
            Err(SiteError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_list_sites_keeps_registration_order() {
        let mut builder = SiteRegistry::builder();
        builder
            .register(config_for(Site::MegaLeiloes))
            .expect("register")
            .register(config_for(Site::MercadoLivre))
            .expect("register")
            .register(config_for(Site::VivaReal))
            .expect("register");
        let registry = builder.build();

        assert_eq!(
            registry.list_sites(),
            vec![Site::MegaLeiloes, Site::MercadoLivre, Site::VivaReal]
        );
    }

    #[test]
    fn test_builtin_registers_every_site() {
        let registry = SiteRegistry::builtin().expect("builtin registry");
        assert_eq!(registry.count(), Site::ALL.len());
        assert_eq!(registry.list_sites(), Site::ALL.to_vec());
    }

    #[test]
    fn test_get_by_name() {
        let registry = SiteRegistry::builtin().expect("builtin registry");

        let config = registry.get_by_name("MERCADO_LIVRE").expect("known site");
        assert_eq!(config.site, Site::MercadoLivre);

        let err = registry.get_by_name("EBAY").expect_err("unknown site");
        assert!(matches!(err, SiteError::UnsupportedSite { .. }));
        assert!(err.to_string().contains("MEGA_LEILOES"));
    }
}
