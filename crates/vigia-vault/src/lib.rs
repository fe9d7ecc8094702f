//! Vigia Vault - Encrypted session storage
//!
//! Holds browser storage states (cookies and origins) per user and site,
//! sealed with ChaCha20-Poly1305, and enforces the session lifecycle.
//!
//! # Security Model
//!
//! - Raw 32-byte keys from the environment, or a passphrase stretched with Argon2id
//! - Every row records the key version that sealed it; stale rows are re-sealed on load
//! - Plaintext buffers are zeroized on drop
//! - No payload content is ever logged or included in error messages
//!
//! # Lifecycle
//!
//! `ACTIVE < NEEDS_REAUTH < EXPIRED < INVALID`. An upload always resets a
//! session to `ACTIVE`; every other event can only keep or raise severity.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vigia_vault::{Keyring, SessionStore};
//!
//! let db = vigia_db::Database::open_and_migrate("vigia.db", 5).await?;
//! let store = SessionStore::new(Arc::new(db), Keyring::single(1, key), 30);
//!
//! store.save("u1", "MERCADO_LIVRE", &payload, None).await?;
//! let session = store.load("u1", "MERCADO_LIVRE").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod key;
pub mod payload;
pub mod store;

pub use cipher::SealedBlob;
pub use error::{DecryptFailure, Result, VaultError};
pub use key::Keyring;
pub use payload::{PayloadSummary, StorageState};
pub use store::{LoadedSession, SaveOutcome, SessionStore, SessionSummary, DEFAULT_TTL_DAYS};
