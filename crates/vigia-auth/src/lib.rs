//! Vigia Authentication Layer
//!
//! Decides which credential a crawl job runs with and hands back a browsing
//! session that carries it.
//!
//! # Cascade
//!
//! Default order, configurable through `[credentials] order`:
//!
//! 1. **db**: the user's uploaded session from the encrypted session store
//! 2. **secret_file**: `<secret_dir>/<SITE>.json`, then `<secret_dir>/storage-state.json`
//! 3. **env**: base64 storage state in `VIGIA_STORAGE_STATE_<SITE>`, then `VIGIA_STORAGE_STATE`
//! 4. **session_manager**: credentials that recently worked, cached in memory with a TTL
//! 5. **anonymous**: only for sites that do not require cookies
//!
//! A source failure, or a browser that refuses to launch with its credential,
//! is logged and the next source is tried.
//!
//! # Cleanup
//!
//! [`AuthContext`] owns the browsing session. Call `cleanup()` when the crawl
//! job ends; a context dropped without cleanup closes its session in the
//! background.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cascade;
pub mod context;
pub mod credential;
pub mod error;
pub mod sources;

pub use cascade::{CredentialCascade, CredentialCascadeBuilder};
pub use context::AuthContext;
pub use credential::{Credential, CredentialSource};
pub use error::{AuthError, Result};
pub use sources::{
    EnvCredentialSource, SecretFileSource, SessionManager, SessionManagerSource,
    SessionStoreSource,
};
