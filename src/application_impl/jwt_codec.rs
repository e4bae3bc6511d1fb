use crate::application_port::{TokenCodec, TokenCodecError, TokenParseOutcome};
use crate::domain_model::*;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_SIGNING_KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    role: String,
    #[serde(rename = "type")]
    token_type: String,
    ver: i64,
    jti: String,
    iat: i64,
    exp: i64,
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Codec {
    pub fn try_new(cfg: JwtConfig) -> Result<Self, TokenCodecError> {
        if cfg.signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(TokenCodecError::InvalidConfiguration(format!(
                "signing key must be at least {} bytes",
                MIN_SIGNING_KEY_LEN
            )));
        }
        if cfg.issuer.trim().is_empty() {
            return Err(TokenCodecError::InvalidConfiguration(
                "issuer must not be blank".to_string(),
            ));
        }
        Self::validate_ttl(cfg.access_ttl, TokenType::Access)?;
        Self::validate_ttl(cfg.refresh_ttl, TokenType::Refresh)?;

        let encoding_key = EncodingKey::from_secret(&cfg.signing_key);
        let decoding_key = DecodingKey::from_secret(&cfg.signing_key);
        Ok(JwtHs256Codec {
            cfg,
            encoding_key,
            decoding_key,
        })
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn validate_ttl(ttl: Duration, token_type: TokenType) -> Result<(), TokenCodecError> {
        if ttl <= Duration::zero() {
            return Err(TokenCodecError::InvalidConfiguration(format!(
                "{} ttl must be positive",
                token_type.as_str().to_lowercase()
            )));
        }
        Self::expiry(Utc::now().timestamp(), ttl)?;
        Ok(())
    }

    /// Claims carry whole seconds; a sub-second ttl still has to outlive `iat`.
    fn expiry(iat: i64, ttl: Duration) -> Result<i64, TokenCodecError> {
        let out_of_range =
            || TokenCodecError::InvalidConfiguration("ttl out of range".to_string());
        let ttl_secs = ttl
            .num_milliseconds()
            .checked_add(999)
            .ok_or_else(out_of_range)?
            / 1000;
        let exp = iat.checked_add(ttl_secs).ok_or_else(out_of_range)?;
        DateTime::<Utc>::from_timestamp(exp, 0).ok_or_else(out_of_range)?;
        Ok(exp)
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.validate_aud = false;
        v.leeway = 0;
        v.set_issuer(&[self.cfg.issuer.clone()]);
        v
    }

    fn into_token_claims(claims: Claims, now: DateTime<Utc>) -> Option<TokenClaims> {
        if claims.sub.trim().is_empty() || claims.jti.trim().is_empty() || claims.ver < 0 {
            return None;
        }
        let role = claims.role.parse::<Role>().ok()?;
        let token_type = claims.token_type.parse::<TokenType>().ok()?;
        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)?;
        if expires_at <= issued_at || issued_at > now {
            return None;
        }
        Some(TokenClaims {
            subject: claims.sub,
            role,
            token_type,
            version: claims.ver as u64,
            jti: claims.jti,
            issued_at,
            expires_at,
        })
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(
        &self,
        subject: &TokenSubject,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenCodecError> {
        Self::validate_ttl(ttl, token_type)?;
        let version = i64::try_from(subject.token_version).map_err(|_| {
            TokenCodecError::InvalidConfiguration("token version out of range".to_string())
        })?;

        let iat = Utc::now().timestamp();
        let exp = Self::expiry(iat, ttl)?;
        let claims = Claims {
            iss: self.cfg.issuer.clone(),
            sub: subject.login_id.clone(),
            role: subject.role.as_str().to_string(),
            token_type: token_type.as_str().to_string(),
            ver: version,
            jti: Self::gen_jti(),
            iat,
            exp,
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenCodecError::Signing(e.to_string()))?;

        let issued_at = DateTime::<Utc>::from_timestamp(iat, 0)
            .ok_or_else(|| TokenCodecError::Signing("issued-at out of range".to_string()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| TokenCodecError::Signing("expiry out of range".to_string()))?;

        Ok(IssuedToken {
            value,
            claims: TokenClaims {
                subject: claims.sub,
                role: subject.role,
                token_type,
                version: subject.token_version,
                jti: claims.jti,
                issued_at,
                expires_at,
            },
        })
    }

    fn issue_access(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenCodecError> {
        self.issue(subject, TokenType::Access, self.cfg.access_ttl)
    }

    fn issue_refresh(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenCodecError> {
        self.issue(subject, TokenType::Refresh, self.cfg.refresh_ttl)
    }

    fn parse(&self, token: &str) -> TokenParseOutcome {
        let token = token.trim();
        if token.is_empty() {
            return TokenParseOutcome::Malformed;
        }

        let data = match decode::<Claims>(token, &self.decoding_key, &self.validation()) {
            Ok(data) => data,
            Err(e) => {
                return match e.kind() {
                    ErrorKind::ExpiredSignature => TokenParseOutcome::Expired,
                    _ => TokenParseOutcome::Malformed,
                };
            }
        };

        let now = Utc::now();
        if data.claims.exp <= now.timestamp() {
            return TokenParseOutcome::Expired;
        }
        match Self::into_token_claims(data.claims, now) {
            Some(claims) => TokenParseOutcome::Valid(claims),
            None => TokenParseOutcome::Malformed,
        }
    }
}
