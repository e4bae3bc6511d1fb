#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),
    #[error("ciphertext invalid: {0}")]
    CryptoInvalid(String),
}

/// At-rest encryption of the stored refresh token.
///
/// Blank input maps to an empty string in both directions: an identity
/// that has never logged in simply has nothing stored.
pub trait RefreshTokenCrypto: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}
