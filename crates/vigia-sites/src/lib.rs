//! Vigia Sites - Per-site crawl configuration.
//!
//! Everything the generic crawl engine needs to treat each marketplace
//! differently lives here as data: selectors, pacing, timing, anti-detection
//! posture, scroll strategy, page-classification text and a few pure parsers.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): [`SiteConfig`] and its parts
//! - **Catalog** ([`catalog`]): built-in configuration for every supported site
//! - **Registry** ([`registry`]): immutable lookup built once at boot
//! - **Selectors** ([`selectors`]): ordered CSS fallback chains
//! - **Patterns** ([`patterns`]): login wall / checkpoint / empty result detection
//! - **Parsers** ([`parsers`]): prices, listing ids, URL normalization
//! - **Extraction** ([`extract`]): listing cards from a rendered page
//!
//! # Example
//!
//! ```rust
//! use vigia_sites::{classify_page, PageClass, SiteRegistry};
//! use vigia_core::Site;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SiteRegistry::builtin()?;
//! let config = registry.get(Site::MercadoLivre)?;
//!
//! let class = classify_page("Para continuar, acesse sua conta", &config.patterns);
//! assert_eq!(class, PageClass::LoginWall);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
pub mod definition;
pub mod error;
pub mod extract;
pub mod parsers;
pub mod patterns;
pub mod registry;
pub mod selectors;

pub use definition::{
    AntiDetection, AuthMode, RateLimit, ScrollStrategy, Selectors, SiteConfig, StealthLevel,
    Timeouts,
};
pub use error::{Result, SiteError};
pub use extract::{extract_listings, Listing};
pub use patterns::{classify_page, contains_any, PageClass, PagePatterns};
pub use registry::{SiteRegistry, SiteRegistryBuilder};
pub use selectors::SelectorChain;
