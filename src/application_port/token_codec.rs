use crate::domain_model::*;
use chrono::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TokenCodecError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TokenParseOutcome {
    Valid(TokenClaims),
    Expired,
    Malformed,
}

impl TokenParseOutcome {
    pub fn valid(self) -> Option<TokenClaims> {
        match self {
            TokenParseOutcome::Valid(claims) => Some(claims),
            _ => None,
        }
    }
}

pub trait TokenCodec: Send + Sync {
    /// Sign a new token for `subject`. Fails on a non-positive ttl.
    fn issue(
        &self,
        subject: &TokenSubject,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenCodecError>;

    fn issue_access(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenCodecError>;

    fn issue_refresh(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenCodecError>;

    /// Never fails: attacker-controlled input only ever yields a status.
    fn parse(&self, token: &str) -> TokenParseOutcome;
}
