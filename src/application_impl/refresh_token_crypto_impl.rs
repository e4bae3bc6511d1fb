use crate::application_port::{CryptoError, RefreshTokenCrypto};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
pub const MIN_SECRET_LEN: usize = 32;

const KEY_DERIVATION_SALT: &[u8] = b"tokenguard-refresh-token";
const KEY_DERIVATION_INFO: &[u8] = b"refresh-token-aes-gcm-key";

/// AES-256-GCM with a fresh nonce per call. Stored form is
/// `base64(nonce || ciphertext || tag)`.
pub struct AesGcmRefreshTokenCrypto {
    cipher: Aes256Gcm,
}

impl AesGcmRefreshTokenCrypto {
    pub fn try_new(secret: &str) -> Result<Self, CryptoError> {
        if secret.trim().is_empty() {
            return Err(CryptoError::ConfigurationInvalid(
                "refresh token secret is blank".to_string(),
            ));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(CryptoError::ConfigurationInvalid(format!(
                "refresh token secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let key = derive_key(secret.as_bytes())?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::ConfigurationInvalid(format!("cipher init: {}", e)))?;
        Ok(AesGcmRefreshTokenCrypto { cipher })
    }
}

fn derive_key(secret: &[u8]) -> Result<[u8; KEY_SIZE], CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(Some(KEY_DERIVATION_SALT), secret);
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(KEY_DERIVATION_INFO, &mut key)
        .map_err(|e| CryptoError::ConfigurationInvalid(format!("key derivation: {}", e)))?;
    Ok(key)
}

impl RefreshTokenCrypto for AesGcmRefreshTokenCrypto {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.trim().is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::CryptoInvalid(format!("encryption failed: {}", e)))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        if ciphertext.trim().is_empty() {
            return Ok(String::new());
        }

        let payload = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| CryptoError::CryptoInvalid(format!("invalid base64: {}", e)))?;
        if payload.len() <= NONCE_SIZE {
            return Err(CryptoError::CryptoInvalid("ciphertext truncated".to_string()));
        }

        let (nonce_bytes, sealed) = payload.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CryptoError::CryptoInvalid("authentication tag mismatch".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::CryptoInvalid(format!("invalid utf-8: {}", e)))
    }
}
