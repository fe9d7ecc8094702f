//! Vigia Application Shell
//!
//! Composition root: loads configuration, wires the session store, site
//! registry, rate limiter and credential cascade into [`AppState`], and
//! exposes the command and crawl-callback surface used by the outer API
//! layer. Core logic lives in the `crates/` directory.

pub mod commands;
pub mod crawl;
pub mod error;
pub mod state;

pub use error::CommandError;
pub use state::AppState;

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vigia=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
