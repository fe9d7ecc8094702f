//! Site configuration commands.

use crate::error::CommandError;
use crate::state::AppState;
use serde::Serialize;
use vigia_core::Site;
use vigia_sites::{AuthMode, SiteConfig};

/// One line of the site list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    /// Site identifier
    pub site: Site,
    /// Primary domain
    pub domain: String,
    /// Credential requirement
    pub auth_mode: AuthMode,
    /// Pages per minute
    pub tokens_per_min: u32,
}

impl From<&SiteConfig> for SiteSummary {
    fn from(config: &SiteConfig) -> Self {
        Self {
            site: config.site,
            domain: config.primary_domain().to_string(),
            auth_mode: config.auth_mode,
            tokens_per_min: config.rate_limit.tokens_per_min,
        }
    }
}

/// Full configuration of one site.
pub fn get_site(state: &AppState, site: String) -> Result<SiteConfig, CommandError> {
    Ok(state.registry.get_by_name(&site)?.clone())
}

/// Every registered site, in registration order.
#[must_use]
pub fn list_sites(state: &AppState) -> Vec<SiteSummary> {
    state.registry.configs().map(SiteSummary::from).collect()
}
