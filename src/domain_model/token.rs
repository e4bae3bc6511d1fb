use crate::domain_model::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "ACCESS",
            TokenType::Refresh => "REFRESH",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = crate::domain_model::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCESS" => Ok(TokenType::Access),
            "REFRESH" => Ok(TokenType::Refresh),
            other => Err(crate::domain_model::UnknownVariant(other.to_string())),
        }
    }
}

/// Verified claim set of a signed token.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenClaims {
    pub subject: String,
    pub role: Role,
    pub token_type: TokenType,
    pub version: u64,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Eq, PartialEq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Clone, Eq, PartialEq, Serialize)]
pub struct RefreshToken(pub String);

// Token values stay out of Debug output so they never land in logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", TokenHash::of(&self.0).short())
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefreshToken({})", TokenHash::of(&self.0).short())
    }
}

/// A freshly signed token together with its own claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub claims: TokenClaims,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn from_issued(access: IssuedToken, refresh: IssuedToken) -> Self {
        TokenPair {
            access_token: AccessToken(access.value),
            refresh_token: RefreshToken(refresh.value),
            access_token_expires_at: access.claims.expires_at,
            refresh_token_expires_at: refresh.claims.expires_at,
        }
    }
}

/// Lowercase hex SHA-256 of a token value. The blacklist only ever sees this.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TokenHash(pub String);

impl TokenHash {
    pub fn of(token: &str) -> Self {
        let digest = Sha256::digest(token.as_bytes());
        TokenHash(hex::encode(digest))
    }

    /// First 12 hex chars, enough to correlate log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BlacklistEntry {
    pub token_hash: TokenHash,
    pub token_type: TokenType,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

impl BlacklistEntry {
    pub fn new(token: &str, claims: &TokenClaims) -> Self {
        BlacklistEntry {
            token_hash: TokenHash::of(token),
            token_type: claims.token_type,
            subject: claims.subject.clone(),
            expires_at: claims.expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
