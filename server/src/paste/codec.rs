//! Authenticated encryption for stored paste versions.
//!
//! Key derivation: HKDF-SHA256(salt, key material, info) -> 256-bit AES key
//! Encryption: AES-256-GCM with random 12-byte nonce
//! Token format: base64url(version (1 byte) || nonce (12 bytes) || ciphertext (includes GCM tag))

use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hkdf::Hkdf;
use rand::Rng;
use sha2::Sha256;

use crate::error::{DecodeError, KeyError};

/// Leading byte of every token; bump when the layout changes.
const TOKEN_VERSION: u8 = 0x01;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Salt for HKDF key derivation (domain separation)
const HKDF_SALT: &[u8] = b"paste-content-key-v1";

/// Info string for HKDF key derivation (purpose binding)
const HKDF_INFO: &[u8] = b"paste-server-version-encryption";

/// Where the process key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Configured,
    /// Generated at startup; lost on restart.
    Ephemeral,
}

/// 256-bit key material shared by every encode/decode in the process.
#[derive(Clone, PartialEq, Eq)]
pub struct CodecKey([u8; 32]);

impl CodecKey {
    pub fn generate() -> Self {
        Self(rand::rng().random())
    }

    /// Parse URL-safe base64 key material. Trailing `=` padding is accepted.
    pub fn from_encoded(encoded: &str) -> Result<Self, KeyError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim().trim_end_matches('='))
            .map_err(|_| KeyError::InvalidKey("not URL-safe base64".to_string()))?;
        let material: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            KeyError::InvalidKey(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(material))
    }

    pub fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Resolve the process key from configuration.
    ///
    /// An absent or blank key falls back to a random one for this process
    /// only. A key that is present but malformed is an error.
    pub fn load(configured: Option<&str>) -> Result<(Self, KeySource), KeyError> {
        match configured.map(str::trim).filter(|k| !k.is_empty()) {
            Some(encoded) => {
                let key = Self::from_encoded(encoded)?;
                tracing::info!("Encryption key loaded from configuration");
                Ok((key, KeySource::Configured))
            }
            None => {
                tracing::warn!(
                    "No encryption key configured (PASTE_ENCRYPT_KEY). Using an EPHEMERAL key: \
                     pastes written by this process cannot be decrypted after restart."
                );
                Ok((Self::generate(), KeySource::Ephemeral))
            }
        }
    }
}

impl fmt::Debug for CodecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CodecKey(..)")
    }
}

/// Reversible, integrity-checked transform between plaintext and a storage token.
pub struct PasteCodec {
    cipher: Aes256Gcm,
}

impl PasteCodec {
    pub fn new(key: &CodecKey) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), &key.0);
        let mut okm = [0u8; 32];
        hk.expand(HKDF_INFO, &mut okm)
            .expect("HKDF expand should not fail for 32-byte output");
        Self {
            cipher: Aes256Gcm::new(&Key::<Aes256Gcm>::from(okm)),
        }
    }

    /// Encrypt `plaintext` under a fresh nonce.
    pub fn encode(&self, plaintext: &str) -> String {
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .expect("AES-256-GCM encryption should not fail");

        let mut raw = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(&self, token: &str) -> Result<String, DecodeError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| DecodeError::Malformed("token is not base64"))?;
        if raw.len() < HEADER_LEN + TAG_LEN {
            return Err(DecodeError::Malformed("token too short"));
        }
        if raw[0] != TOKEN_VERSION {
            return Err(DecodeError::Malformed("unknown token version"));
        }

        let nonce = Nonce::from_slice(&raw[1..HEADER_LEN]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &raw[HEADER_LEN..])
            .map_err(|_| DecodeError::Authentication)?;
        String::from_utf8(plaintext).map_err(|_| DecodeError::Malformed("plaintext is not UTF-8"))
    }
}
