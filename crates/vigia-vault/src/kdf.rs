//! Passphrase stretching with Argon2id.
//!
//! Used only when a deployment supplies a passphrase instead of a raw
//! 32-byte session key. The salt lives in a file next to the database and
//! is created on first use.
//!
//! # Parameters
//!
//! - Algorithm: Argon2id, version 0x13
//! - Memory cost: 64 MB
//! - Time cost: 3 iterations
//! - Parallelism: 1 lane
//! - Output: 32 bytes

use crate::cipher::KEY_LENGTH;
use crate::error::{Result, VaultError};
use argon2::{Algorithm, Argon2, ParamsBuilder, Version};
use rand::{rngs::OsRng, RngCore};
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Length of the salt in bytes.
pub const SALT_LENGTH: usize = 32;

const MEMORY_COST_KB: u32 = 65_536;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 1;

/// Generate a random salt.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Read the salt at `path`, creating it if the file does not exist.
///
/// # Errors
/// Returns `VaultError::KeyDerivation` if the file cannot be read or
/// written, or has the wrong length.
pub fn load_or_create_salt(path: &Path) -> Result<[u8; SALT_LENGTH]> {
    if path.exists() {
        let bytes = fs::read(path).map_err(|e| {
            VaultError::KeyDerivation(format!("failed to read salt file {}: {e}", path.display()))
        })?;
        return bytes.try_into().map_err(|bytes: Vec<u8>| {
            VaultError::KeyDerivation(format!(
                "invalid salt file {}: expected {SALT_LENGTH} bytes, got {}",
                path.display(),
                bytes.len()
            ))
        });
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            VaultError::KeyDerivation(format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let salt = generate_salt();
    fs::write(path, salt).map_err(|e| {
        VaultError::KeyDerivation(format!("failed to write salt file {}: {e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), "Created passphrase salt");

    Ok(salt)
}

/// Derive a 256-bit key from `passphrase` and `salt`.
///
/// # Errors
/// Returns `VaultError::KeyDerivation` if the salt has the wrong length or
/// Argon2 fails.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(VaultError::KeyDerivation(format!(
            "invalid salt length: expected {SALT_LENGTH} bytes, got {}",
            salt.len()
        )));
    }

    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KB)
        .t_cost(TIME_COST)
        .p_cost(PARALLELISM)
        .output_len(KEY_LENGTH)
        .build()
        .map_err(|e| VaultError::KeyDerivation(format!("failed to build parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, key.as_mut())
        .map_err(|e| VaultError::KeyDerivation(format!("key derivation failed: {e}")))?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_same_inputs_same_key() {
        let salt = generate_salt();
        let a = derive_key("correct horse", &salt).expect("derive a");
        let b = derive_key("correct horse", &salt).expect("derive b");
        assert_eq!(*a, *b);

        let other = derive_key("battery staple", &salt).expect("derive other");
        assert_ne!(*a, *other);
    }

    #[test]
    fn test_rejects_short_salt() {
        let err = derive_key("passphrase", &[0u8; 16]).expect_err("short salt");
        assert!(matches!(err, VaultError::KeyDerivation(msg) if msg.contains("invalid salt length")));
    }

    #[test]
    fn test_salt_file_created_once() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("nested").join(".session_salt");

        let first = load_or_create_salt(&path).expect("create salt");
        assert!(path.exists());
        let second = load_or_create_salt(&path).expect("reload salt");
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_salt_file_rejected() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(".session_salt");
        fs::write(&path, b"short").expect("write salt");

        let err = load_or_create_salt(&path).expect_err("corrupt salt");
        assert!(err.to_string().contains("expected 32 bytes, got 5"));
    }
}
