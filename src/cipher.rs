// src/cipher.rs
//! Password encryption with a locally persisted symmetric key.
//!
//! Ciphertexts are `base64url(nonce || ciphertext || tag)` produced with
//! ChaCha20-Poly1305, which keeps them printable inside a TOML string.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{RngCore, rngs::OsRng};

use crate::{
    error::{FanPadError, Result},
    storage::write_private_atomic,
};

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric cipher holding one key for the lifetime of the process.
pub struct PasswordCipher {
    key: [u8; KEY_LEN],
}

impl PasswordCipher {
    /// Loads the key at `key_path`, generating and persisting a fresh one if absent.
    pub fn load_or_generate(key_path: impl Into<PathBuf>) -> Result<Self> {
        let key_path = key_path.into();
        let key = match fs::read(&key_path) {
            Ok(bytes) => decode_key(&key_path, &bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let key = generate_key();
                write_private_atomic(&key_path, &key)?;
                tracing::info!(path = %key_path.display(), "generated new cipher key");
                key
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { key })
    }

    /// Builds a cipher around an in-memory key, without touching the filesystem.
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| FanPadError::Decryption("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE.encode(sealed))
    }

    /// Fails with [`FanPadError::Decryption`] on malformed input, a foreign key,
    /// or a failed integrity check.
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let sealed = URL_SAFE
            .decode(encoded.trim())
            .map_err(|e| FanPadError::Decryption(format!("not valid base64: {}", e)))?;

        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(FanPadError::Decryption(format!(
                "ciphertext too short ({} bytes)",
                sealed.len()
            )));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| FanPadError::Decryption("integrity check failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| FanPadError::Decryption("plaintext is not UTF-8".to_string()))
    }
}

fn generate_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

fn decode_key(path: &Path, bytes: &[u8]) -> Result<[u8; KEY_LEN]> {
    bytes.try_into().map_err(|_| FanPadError::KeyFile {
        path: path.to_path_buf(),
        reason: format!("expected {} bytes, found {}", KEY_LEN, bytes.len()),
    })
}
