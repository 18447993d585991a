// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric key vault for private keys at rest.
//!
//! ## Blob Format
//!
//! ```text
//! base64url_unpadded( version(1) || nonce(12) || ciphertext || tag(16) )
//! ```
//!
//! The blob carries its own nonce and tag, so decryption needs nothing but the
//! process-wide secret. A fresh random nonce is drawn for every encryption.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

const BLOB_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid vault secret: {0}")]
    InvalidSecret(&'static str),

    #[error("encryption failed")]
    Encryption,

    /// Covers malformed blobs, foreign ciphertext and a wrong secret alike.
    #[error("decryption failed")]
    Decryption,
}

pub type VaultResult<T> = Result<T, VaultError>;

/// AES-256-GCM vault keyed by a single long-lived secret.
#[derive(Clone)]
pub struct KeyVault {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault").finish_non_exhaustive()
    }
}

impl KeyVault {
    /// Build a vault from a URL-safe base64 secret decoding to exactly 32 bytes.
    ///
    /// Trailing `=` padding is accepted so Fernet-style keys can be reused.
    pub fn from_secret(secret: &SecretString) -> VaultResult<Self> {
        let trimmed = secret.expose_secret().trim().trim_end_matches('=');
        if trimmed.is_empty() {
            return Err(VaultError::InvalidSecret("secret is empty"));
        }
        let key = Zeroizing::new(
            Base64UrlUnpadded::decode_vec(trimmed)
                .map_err(|_| VaultError::InvalidSecret("secret is not URL-safe base64"))?,
        );
        Self::from_key_bytes(&key)
    }

    pub fn from_key_bytes(key: &[u8]) -> VaultResult<Self> {
        if key.len() != KEY_LEN {
            return Err(VaultError::InvalidSecret("secret must decode to 32 bytes"));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| VaultError::InvalidSecret("secret must decode to 32 bytes"))?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> VaultResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::Encryption)?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(Base64UrlUnpadded::encode_string(&blob))
    }

    /// Decrypt a blob produced by [`KeyVault::encrypt`].
    ///
    /// Every call returns a fresh buffer that is wiped on drop.
    pub fn decrypt(&self, blob: &str) -> VaultResult<Zeroizing<Vec<u8>>> {
        let raw = Base64UrlUnpadded::decode_vec(blob.trim()).map_err(|_| VaultError::Decryption)?;
        if raw.len() < 1 + NONCE_LEN + TAG_LEN || raw[0] != BLOB_VERSION {
            return Err(VaultError::Decryption);
        }
        let (nonce, ciphertext) = raw[1..].split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| VaultError::Decryption)
    }
}
