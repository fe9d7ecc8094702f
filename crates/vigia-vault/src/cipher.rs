//! Sealed blobs using ChaCha20-Poly1305 AEAD.
//!
//! # Security Properties
//!
//! - **Confidentiality**: `ChaCha20` stream cipher
//! - **Authenticity**: `Poly1305` MAC, stored detached
//! - **Nonce**: 96-bit random nonce per encryption
//! - **Key**: 256-bit, selected from the [`Keyring`](crate::key::Keyring)
//!
//! The persisted text form is `hex(nonce):hex(tag):hex(ciphertext)`.

use crate::error::{DecryptFailure, Result, VaultError};
use chacha20poly1305::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce, Tag,
};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Length of the key in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Length of the nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_LENGTH: usize = 12;

/// Length of the authentication tag in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

const SEPARATOR: char = ':';

/// Ciphertext with its nonce and detached authentication tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    nonce: [u8; NONCE_LENGTH],
    tag: [u8; TAG_LENGTH],
    ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Encrypt `plaintext` under `key` with a fresh random nonce.
    ///
    /// # Errors
    /// Returns `VaultError::Encryption` if the cipher rejects the input.
    pub fn seal(plaintext: &[u8], key: &[u8; KEY_LENGTH]) -> Result<Self> {
        let cipher = ChaCha20Poly1305::new(key.into());
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|e| VaultError::Encryption(format!("encryption failed: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        nonce_bytes.copy_from_slice(&nonce);
        let mut tag_bytes = [0u8; TAG_LENGTH];
        tag_bytes.copy_from_slice(&tag);

        Ok(Self {
            nonce: nonce_bytes,
            tag: tag_bytes,
            ciphertext: buffer,
        })
    }

    /// Decrypt under `key`. The plaintext is zeroized when dropped.
    ///
    /// # Errors
    /// Returns `DecryptFailure::TagMismatch` for a wrong key or tampered data.
    pub fn open(
        &self,
        key: &[u8; KEY_LENGTH],
    ) -> std::result::Result<Zeroizing<Vec<u8>>, DecryptFailure> {
        let cipher = ChaCha20Poly1305::new(key.into());

        let mut buffer = Zeroizing::new(self.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&self.nonce),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(&self.tag),
            )
            .map_err(|_| DecryptFailure::TagMismatch)?;

        Ok(buffer)
    }

    /// Nonce used for this encryption.
    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    /// Ciphertext without the tag.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl fmt::Display for SealedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(self.nonce),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }
}

fn decode_fixed<const N: usize>(
    segment: &str,
    name: &str,
) -> std::result::Result<[u8; N], DecryptFailure> {
    let bytes = hex::decode(segment)
        .map_err(|e| DecryptFailure::MalformedBlob(format!("{name} is not valid hex: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        DecryptFailure::MalformedBlob(format!(
            "{name} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

impl FromStr for SealedBlob {
    type Err = DecryptFailure;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().split(SEPARATOR).collect();
        let [nonce, tag, ciphertext] = segments.as_slice() else {
            return Err(DecryptFailure::MalformedBlob(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        };

        Ok(Self {
            nonce: decode_fixed::<NONCE_LENGTH>(nonce, "nonce")?,
            tag: decode_fixed::<TAG_LENGTH>(tag, "tag")?,
            ciphertext: hex::decode(ciphertext).map_err(|e| {
                DecryptFailure::MalformedBlob(format!("ciphertext is not valid hex: {e}"))
            })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LENGTH] = [0x42; KEY_LENGTH];

    #[test]
    fn test_seal_open_through_text_form() {
        let payload = br#"{"cookies":[{"domain":".mercadolivre.com.br"}],"origins":[]}"#;

        let text = SealedBlob::seal(payload, &KEY).expect("seal").to_string();
        assert_eq!(text.split(':').count(), 3);

        let blob: SealedBlob = text.parse().expect("parse blob");
        let opened = blob.open(&KEY).expect("open");
        assert_eq!(opened.as_slice(), payload);
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let a = SealedBlob::seal(b"same", &KEY).expect("seal a");
        let b = SealedBlob::seal(b"same", &KEY).expect("seal b");

        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn test_ciphertext_excludes_tag() {
        let blob = SealedBlob::seal(b"four", &KEY).expect("seal");
        assert_eq!(blob.ciphertext().len(), 4);
    }

    #[test]
    fn test_wrong_key_is_tag_mismatch() {
        let blob = SealedBlob::seal(b"secret", &KEY).expect("seal");
        let err = blob.open(&[0x43; KEY_LENGTH]).expect_err("wrong key");
        assert_eq!(err, DecryptFailure::TagMismatch);
    }

    #[test]
    fn test_tampered_ciphertext_is_tag_mismatch() {
        let mut blob = SealedBlob::seal(b"secret", &KEY).expect("seal");
        blob.ciphertext[0] ^= 0xFF;
        let err = blob.open(&KEY).expect_err("tampered ciphertext");
        assert_eq!(err, DecryptFailure::TagMismatch);
    }

    #[test]
    fn test_tampered_tag_is_tag_mismatch() {
        let mut blob = SealedBlob::seal(b"secret", &KEY).expect("seal");
        blob.tag[15] ^= 0x01;
        let err = blob.open(&KEY).expect_err("tampered tag");
        assert_eq!(err, DecryptFailure::TagMismatch);
    }

    #[test]
    fn test_malformed_segment_count() {
        for text in ["", "abcd", "aa:bb", "aa:bb:cc:dd"] {
            let err = text.parse::<SealedBlob>().expect_err("must reject");
            assert!(
                matches!(err, DecryptFailure::MalformedBlob(_)),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_malformed_hex_and_lengths() {
        let nonce = "00".repeat(NONCE_LENGTH);
        let tag = "11".repeat(TAG_LENGTH);

        let bad_hex = format!("{nonce}:{tag}:zz");
        assert!(matches!(
            bad_hex.parse::<SealedBlob>(),
            Err(DecryptFailure::MalformedBlob(_))
        ));

        let short_nonce = format!("0000:{tag}:abcd");
        let err = short_nonce.parse::<SealedBlob>().expect_err("short nonce");
        assert!(err.to_string().contains("nonce must be 12 bytes"));

        let short_tag = format!("{nonce}:11:abcd");
        let err = short_tag.parse::<SealedBlob>().expect_err("short tag");
        assert!(err.to_string().contains("tag must be 16 bytes"));
    }
}
