//! Vigia Core - Foundation crate for the Vigia marketplace crawler.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other Vigia crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`Site`, `UserId`, `SessionStatus`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use vigia_core::{AppConfig, SessionEvent, SessionStatus, Site};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.sessions.ttl_days, 30);
//!
//! let site: Site = "MERCADO_LIVRE".parse()?;
//! assert_eq!(site.primary_domain(), "mercadolivre.com.br");
//!
//! let status = SessionStatus::Active.apply(SessionEvent::LoginWall);
//! assert_eq!(status, SessionStatus::NeedsReauth);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CredentialConfig, DatabaseConfig, KeyReference, SessionConfig,
    VaultConfig,
};
pub use error::{ConfigError, ConfigResult, Result, VigiaError};
pub use types::{
    CredentialSourceKind, SessionEvent, SessionId, SessionStatus, Site, Timestamp, UserId,
};
