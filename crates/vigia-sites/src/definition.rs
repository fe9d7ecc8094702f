//! Site configuration types.
//!
//! One [`SiteConfig`] describes everything the generic crawl engine needs to
//! know about a marketplace: where to look, how fast to go, how careful to be
//! and how to read what comes back.

use crate::error::{Result, SiteError};
use crate::patterns::PagePatterns;
use crate::selectors::SelectorChain;
use serde::Serialize;
use std::time::Duration;
use vigia_core::Site;

/// Whether a site can be crawled without a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Never uses credentials
    Anonymous,
    /// Uses credentials when available, falls back to anonymous
    CookiesOptional,
    /// Refuses to crawl without credentials
    CookiesRequired,
}

impl AuthMode {
    /// Whether an anonymous crawl is acceptable when no credential resolves.
    #[must_use]
    pub fn allows_anonymous(&self) -> bool {
        !matches!(self, Self::CookiesRequired)
    }
}

/// Selector chains for the fields of a listing card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selectors {
    /// One element per listing
    pub container: SelectorChain,
    /// Listing title
    pub title: SelectorChain,
    /// Displayed price
    pub price: SelectorChain,
    /// Anchor to the listing page
    pub link: SelectorChain,
    /// City or neighbourhood
    pub location: SelectorChain,
    /// Thumbnail
    pub image: SelectorChain,
}

impl Selectors {
    fn named(&self) -> [(&'static str, &SelectorChain); 6] {
        [
            ("container", &self.container),
            ("title", &self.title),
            ("price", &self.price),
            ("link", &self.link),
            ("location", &self.location),
            ("image", &self.image),
        ]
    }
}

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Bucket capacity, refilled continuously over one minute
    pub tokens_per_min: u32,
}

/// Navigation and retry timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeouts {
    /// Budget per attempt in milliseconds, non-decreasing
    pub retry_budgets_ms: Vec<u64>,
    /// Page navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// Wait after load before reading the DOM, in milliseconds
    pub render_delay_ms: u64,
}

impl Timeouts {
    /// Budget for a zero-based attempt; attempts past the list reuse the last budget.
    #[must_use]
    pub fn budget_for(&self, attempt: usize) -> Option<Duration> {
        self.retry_budgets_ms
            .get(attempt)
            .or_else(|| self.retry_budgets_ms.last())
            .copied()
            .map(Duration::from_millis)
    }

    /// Number of attempts the crawl engine should make.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.retry_budgets_ms.len()
    }

    /// Navigation timeout.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Render delay.
    #[must_use]
    pub fn render_delay(&self) -> Duration {
        Duration::from_millis(self.render_delay_ms)
    }
}

/// How result pages are scrolled to trigger lazy loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollStrategy {
    /// Scroll a fixed number of times
    Fixed {
        /// Number of scroll steps
        steps: u32,
        /// Pause between steps in milliseconds
        delay_ms: u64,
    },
    /// Scroll until the listing count stops growing
    Adaptive {
        /// Hard cap on scroll attempts
        max_attempts: u32,
        /// Consecutive attempts without growth before stopping
        stable_threshold: u32,
        /// Pause between attempts in milliseconds
        delay_ms: u64,
    },
}

/// How hard the browser works to look like a regular visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StealthLevel {
    /// Plain headless browser
    Minimal,
    /// Realistic user agent and viewport
    Standard,
    /// Full fingerprint masking
    Aggressive,
}

/// Anti-detection posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct AntiDetection {
    /// Overall stealth level
    pub stealth_level: StealthLevel,
    /// Block image requests
    pub block_images: bool,
    /// Block font requests
    pub block_fonts: bool,
    /// Block audio/video requests
    pub block_media: bool,
    /// Block stylesheet requests
    pub block_stylesheets: bool,
    /// Pick a random common viewport per session
    pub randomize_viewport: bool,
    /// Inject fingerprint-masking scripts before page scripts run
    pub inject_stealth_scripts: bool,
}

impl AntiDetection {
    /// Network resource types to block, using DevTools resource type names.
    #[must_use]
    pub fn blocked_resource_types(&self) -> Vec<&'static str> {
        [
            (self.block_images, "Image"),
            (self.block_fonts, "Font"),
            (self.block_media, "Media"),
            (self.block_stylesheets, "Stylesheet"),
        ]
        .into_iter()
        .filter_map(|(blocked, kind)| blocked.then_some(kind))
        .collect()
    }
}

/// Parses a displayed price into centavos.
pub type PriceParser = fn(&str) -> Option<i64>;
/// Extracts the site's listing identifier from a listing URL.
pub type ExternalIdExtractor = fn(&str) -> Option<String>;
/// Canonicalizes a listing URL.
pub type UrlNormalizer = fn(&str) -> Option<String>;

/// Complete configuration for one site.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Site identifier
    pub site: Site,
    /// Ordered domains, primary first
    pub domains: Vec<String>,
    /// Credential requirement
    pub auth_mode: AuthMode,
    /// Search URL with a `{query}` placeholder
    pub search_url: String,
    /// Listing field selectors
    pub selectors: Selectors,
    /// Request pacing
    pub rate_limit: RateLimit,
    /// Timing
    pub timeouts: Timeouts,
    /// Lazy-load scrolling
    pub scroll_strategy: ScrollStrategy,
    /// Browser posture
    pub anti_detection: AntiDetection,
    /// Page classification text
    pub patterns: PagePatterns,
    /// Price parser
    #[serde(skip)]
    pub price_parser: PriceParser,
    /// Listing id extractor
    #[serde(skip)]
    pub external_id: ExternalIdExtractor,
    /// Listing URL normalizer
    #[serde(skip)]
    pub normalize_url: UrlNormalizer,
}

impl SiteConfig {
    /// Primary domain.
    #[must_use]
    pub fn primary_domain(&self) -> &str {
        self.domains.first().map_or("", String::as_str)
    }

    /// Search URL for a query, percent-encoding the query.
    #[must_use]
    pub fn search_url_for(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.search_url.replace("{query}", &encoded)
    }

    /// Whether a host belongs to this site (exact domain or subdomain).
    #[must_use]
    pub fn owns_host(&self, host: &str) -> bool {
        let host = host.trim_start_matches('.').to_ascii_lowercase();
        self.domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }

    /// Validate the configuration for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| SiteError::ValidationError {
            site: self.site,
            reason,
        };

        if self.domains.is_empty() {
            return Err(invalid("domain list cannot be empty".to_string()));
        }
        if self.primary_domain() != self.site.primary_domain() {
            return Err(invalid(format!(
                "primary domain must be {}, got {}",
                self.site.primary_domain(),
                self.primary_domain()
            )));
        }

        if !self.search_url.contains("{query}") {
            return Err(invalid("search URL must contain {query}".to_string()));
        }

        if self.rate_limit.tokens_per_min == 0 {
            return Err(invalid("tokens_per_min must be positive".to_string()));
        }

        let budgets = &self.timeouts.retry_budgets_ms;
        if budgets.is_empty() {
            return Err(invalid("at least one retry budget is required".to_string()));
        }
        if budgets.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(invalid(format!(
                "retry budgets must not decrease, got {budgets:?}"
            )));
        }
        if self.timeouts.navigation_timeout_ms == 0 {
            return Err(invalid("navigation timeout must be positive".to_string()));
        }

        match self.scroll_strategy {
            ScrollStrategy::Fixed { steps: 0, .. } => {
                return Err(invalid("fixed scroll needs at least one step".to_string()));
            }
            ScrollStrategy::Adaptive {
                max_attempts,
                stable_threshold,
                ..
            } if max_attempts == 0 || stable_threshold == 0 || stable_threshold > max_attempts => {
                return Err(invalid(format!(
                    "adaptive scroll needs 0 < stable_threshold <= max_attempts, got {stable_threshold}/{max_attempts}"
                )));
            }
            _ => {}
        }

        if self.selectors.container.is_empty() {
            return Err(invalid("container selectors cannot be empty".to_string()));
        }
        for (field, chain) in self.selectors.named() {
            chain
                .validate()
                .map_err(|e| invalid(format!("{field}: {e}")))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn test_auth_mode_anonymous_fallback() {
        assert!(AuthMode::Anonymous.allows_anonymous());
        assert!(AuthMode::CookiesOptional.allows_anonymous());
        assert!(!AuthMode::CookiesRequired.allows_anonymous());
    }

    #[test]
    fn test_budget_for_reuses_last_budget() {
        let timeouts = Timeouts {
            retry_budgets_ms: vec![1_000, 2_000, 4_000],
            navigation_timeout_ms: 30_000,
            render_delay_ms: 500,
        };
        assert_eq!(timeouts.budget_for(0), Some(Duration::from_secs(1)));
        assert_eq!(timeouts.budget_for(2), Some(Duration::from_secs(4)));
        assert_eq!(timeouts.budget_for(9), Some(Duration::from_secs(4)));
        assert_eq!(timeouts.max_attempts(), 3);
    }

    #[test]
    fn test_blocked_resource_types() {
        let posture = AntiDetection {
            stealth_level: StealthLevel::Standard,
            block_images: true,
            block_fonts: false,
            block_media: true,
            block_stylesheets: false,
            randomize_viewport: false,
            inject_stealth_scripts: false,
        };
        assert_eq!(posture.blocked_resource_types(), vec!["Image", "Media"]);
    }

    #[test]
    fn test_search_url_encodes_query() {
        let config = catalog::config_for(Site::Olx);
        let url = config.search_url_for("bicicleta aro 29");
        assert!(url.contains("bicicleta+aro+29"), "{url}");
        assert!(!url.contains("{query}"));
    }

    #[test]
    fn test_owns_host_matches_subdomains() {
        let config = catalog::config_for(Site::MercadoLivre);
        assert!(config.owns_host("lista.mercadolivre.com.br"));
        assert!(config.owns_host(".mercadolivre.com.br"));
        assert!(!config.owns_host("notmercadolivre.com.br"));
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = catalog::config_for(Site::Olx);
        config.rate_limit.tokens_per_min = 0;
        assert!(matches!(
            config.validate(),
            Err(SiteError::ValidationError { site: Site::Olx, .. })
        ));

        let mut config = catalog::config_for(Site::Olx);
        config.timeouts.retry_budgets_ms = vec![5_000, 1_000];
        assert!(config.validate().is_err());

        let mut config = catalog::config_for(Site::Olx);
        config.domains = vec!["example.com".to_string()];
        assert!(config.validate().is_err());

        let mut config = catalog::config_for(Site::Olx);
        config.selectors.title = SelectorChain::new(["h2["]);
        let err = config.validate().expect_err("bad selector");
        assert!(err.to_string().contains("title"));

        let mut config = catalog::config_for(Site::Olx);
        config.scroll_strategy = ScrollStrategy::Adaptive {
            max_attempts: 3,
            stable_threshold: 5,
            delay_ms: 100,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serializes_without_function_pointers() {
        let config = catalog::config_for(Site::ZapImoveis);
        let value = serde_json::to_value(&config).expect("serialize");
        assert_eq!(value["site"], "ZAP_IMOVEIS");
        assert_eq!(value["authMode"], "cookies_optional");
        assert!(value["rateLimit"]["tokensPerMin"].is_number());
        assert!(value.get("priceParser").is_none());
    }
}
