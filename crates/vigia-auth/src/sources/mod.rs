//! Built-in credential sources, in their default cascade order.

pub mod env;
pub mod manager;
pub mod secret_file;
pub mod store;

pub use env::EnvCredentialSource;
pub use manager::{SessionManager, SessionManagerSource};
pub use secret_file::SecretFileSource;
pub use store::SessionStoreSource;
