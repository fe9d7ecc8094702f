//! Versioned key material for the session cipher.
//!
//! Every sealed blob is stored with the version of the key that sealed it.
//! The highest version in the ring is the current key; older versions stay
//! available so existing rows can still be opened and re-sealed.

use crate::cipher::KEY_LENGTH;
use crate::error::{Result, VaultError};
use crate::kdf;
use base64ct::{Base64, Encoding};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use vigia_core::VaultConfig;
use zeroize::Zeroizing;

/// Set of session keys indexed by version.
#[derive(Default)]
pub struct Keyring {
    keys: BTreeMap<u32, Zeroizing<[u8; KEY_LENGTH]>>,
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("versions", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Keyring {
    /// Ring holding a single key.
    #[must_use]
    pub fn single(version: u32, key: [u8; KEY_LENGTH]) -> Self {
        let mut ring = Self::default();
        ring.keys.insert(version, Zeroizing::new(key));
        ring
    }

    /// Add a key, replacing any key with the same version.
    pub fn insert(&mut self, version: u32, key: Zeroizing<[u8; KEY_LENGTH]>) {
        self.keys.insert(version, key);
    }

    /// Whether the ring holds no key at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Current (highest) version and its key.
    ///
    /// # Errors
    /// Returns `VaultError::KeyUnavailable` if the ring is empty.
    pub fn current(&self) -> Result<(u32, &[u8; KEY_LENGTH])> {
        self.keys
            .iter()
            .next_back()
            .map(|(version, key)| (*version, &**key))
            .ok_or_else(|| VaultError::KeyUnavailable("keyring is empty".to_string()))
    }

    /// Key for a specific version.
    #[must_use]
    pub fn get(&self, version: u32) -> Option<&[u8; KEY_LENGTH]> {
        self.keys.get(&version).map(|key| &**key)
    }

    /// Build the ring from configuration.
    ///
    /// Raw keys named in `[vault.keys]` are read through `lookup`. When none
    /// is present, the passphrase variable is stretched with Argon2id using
    /// the salt at `vault.salt_path` (or `default_salt_path`).
    ///
    /// # Errors
    /// Returns `VaultError::KeyUnavailable` if no key material is found or a
    /// key does not decode to 32 bytes, and `VaultError::KeyDerivation` if
    /// passphrase stretching fails.
    pub fn from_config(
        config: &VaultConfig,
        default_salt_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut ring = Self::default();

        for reference in &config.keys {
            if let Some(value) = lookup(&reference.env) {
                let key = decode_key(&value).map_err(|reason| {
                    VaultError::KeyUnavailable(format!("{}: {reason}", reference.env))
                })?;
                ring.insert(reference.version, key);
                tracing::debug!(version = reference.version, env = %reference.env, "Loaded session key");
            }
        }

        if ring.is_empty() {
            if let Some(passphrase) = lookup(&config.passphrase_env) {
                let passphrase = Zeroizing::new(passphrase);
                let salt_path = config.salt_path.as_deref().unwrap_or(default_salt_path);
                let salt = kdf::load_or_create_salt(salt_path)?;
                let key = kdf::derive_key(&passphrase, &salt)?;
                ring.insert(config.passphrase_version, key);
                tracing::debug!(
                    version = config.passphrase_version,
                    "Derived session key from passphrase"
                );
            }
        }

        if ring.is_empty() {
            let names: Vec<&str> = config.keys.iter().map(|k| k.env.as_str()).collect();
            return Err(VaultError::KeyUnavailable(format!(
                "set one of [{}] or {}",
                names.join(", "),
                config.passphrase_env
            )));
        }

        Ok(ring)
    }
}

/// Decode a 32-byte key given as 64 hex characters or standard base64.
///
/// # Errors
/// Returns a description of the problem; the key itself is never echoed.
pub fn decode_key(text: &str) -> std::result::Result<Zeroizing<[u8; KEY_LENGTH]>, String> {
    let text = text.trim();

    let bytes = if text.len() == KEY_LENGTH * 2 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        Zeroizing::new(hex::decode(text).map_err(|e| format!("invalid hex key: {e}"))?)
    } else {
        Zeroizing::new(
            Base64::decode_vec(text).map_err(|_| "key is neither hex nor base64".to_string())?,
        )
    };

    if bytes.len() != KEY_LENGTH {
        return Err(format!(
            "key must be {KEY_LENGTH} bytes, got {}",
            bytes.len()
        ));
    }

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    key.copy_from_slice(&bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use vigia_core::KeyReference;

    fn two_key_config() -> VaultConfig {
        VaultConfig {
            keys: vec![
                KeyReference {
                    version: 1,
                    env: "KEY_V1".to_string(),
                },
                KeyReference {
                    version: 2,
                    env: "KEY_V2".to_string(),
                },
            ],
            ..VaultConfig::default()
        }
    }

    #[test]
    fn test_decode_hex_and_base64() {
        let hex_key = "11".repeat(32);
        assert_eq!(*decode_key(&hex_key).expect("hex key"), [0x11; 32]);

        let b64 = Base64::encode_string(&[0x22; 32]);
        assert_eq!(*decode_key(&b64).expect("base64 key"), [0x22; 32]);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = decode_key(&Base64::encode_string(&[0u8; 16])).expect_err("16 bytes");
        assert!(err.contains("got 16"));
        assert!(decode_key("not a key!").is_err());
    }

    #[test]
    fn test_highest_version_is_current() {
        let env: HashMap<&str, String> = [
            ("KEY_V1", "01".repeat(32)),
            ("KEY_V2", "02".repeat(32)),
        ]
        .into_iter()
        .collect();

        let ring = Keyring::from_config(&two_key_config(), Path::new("/unused"), |name| {
            env.get(name).cloned()
        })
        .expect("build keyring");

        let (version, key) = ring.current().expect("current key");
        assert_eq!(version, 2);
        assert_eq!(*key, [0x02; 32]);
        assert_eq!(ring.get(1), Some(&[0x01; 32]));
        assert!(ring.get(3).is_none());
    }

    #[test]
    fn test_missing_versions_are_skipped() {
        let ring = Keyring::from_config(&two_key_config(), Path::new("/unused"), |name| {
            (name == "KEY_V1").then(|| "01".repeat(32))
        })
        .expect("build keyring");

        assert_eq!(ring.current().expect("current").0, 1);
    }

    #[test]
    fn test_passphrase_fallback_uses_salt_file() {
        let dir = TempDir::new().expect("create temp dir");
        let salt_path = dir.path().join(".session_salt");
        let config = VaultConfig::default();

        let lookup = |name: &str| {
            (name == "VIGIA_SESSION_PASSPHRASE").then(|| "correct horse battery".to_string())
        };
        let first = Keyring::from_config(&config, &salt_path, lookup).expect("derive");
        let second = Keyring::from_config(&config, &salt_path, lookup).expect("derive again");

        assert!(salt_path.exists());
        assert_eq!(first.current().expect("current").0, 1);
        assert_eq!(
            first.current().expect("current").1,
            second.current().expect("current").1
        );
    }

    #[test]
    fn test_no_material_is_key_unavailable() {
        let err = Keyring::from_config(&VaultConfig::default(), Path::new("/unused"), |_| None)
            .expect_err("no keys");
        assert!(matches!(err, VaultError::KeyUnavailable(_)));
        assert!(err.to_string().contains("VIGIA_SESSION_KEY"));
    }

    #[test]
    fn test_bad_key_names_variable_not_value() {
        let err = Keyring::from_config(&VaultConfig::default(), Path::new("/unused"), |_| {
            Some("deadbeef".to_string())
        })
        .expect_err("bad key");
        let message = err.to_string();
        assert!(message.contains("VIGIA_SESSION_KEY"));
        assert!(!message.contains("deadbeef"));
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let ring = Keyring::single(7, [0xAB; 32]);
        let debug = format!("{ring:?}");
        assert!(debug.contains('7'));
        assert!(!debug.contains("171"));
    }
}
