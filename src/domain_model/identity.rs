use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct IdentityId(pub i64);

impl IdentityId {
    /// Ids come from an auto-increment column, so anything below 1 never names a row.
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(IdentityId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            "GUEST" => Ok(Role::Guest),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveStatus {
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveStatus::Active => "ACTIVE",
            ActiveStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for ActiveStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ActiveStatus::Active),
            "INACTIVE" => Ok(ActiveStatus::Inactive),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

/// The mutable token fields of an identity. Rotation and revocation swap
/// this pair as one unit.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct TokenState {
    pub token_version: u64,
    pub encrypted_refresh_token: Option<String>,
}

impl TokenState {
    pub fn with_refresh(&self, encrypted_refresh_token: String) -> Self {
        TokenState {
            token_version: self.token_version,
            encrypted_refresh_token: Some(encrypted_refresh_token),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityRecord {
    pub id: IdentityId,
    pub login_id: String,
    pub role: Role,
    pub active: ActiveStatus,
    pub token_state: TokenState,
}

impl IdentityRecord {
    pub fn new(id: IdentityId, login_id: impl Into<String>, role: Role) -> Self {
        IdentityRecord {
            id,
            login_id: login_id.into(),
            role,
            active: ActiveStatus::Active,
            token_state: TokenState::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active == ActiveStatus::Active
    }

    pub fn token_version(&self) -> u64 {
        self.token_state.token_version
    }

    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            login_id: self.login_id.clone(),
            role: self.role,
            token_version: self.token_state.token_version,
        }
    }
}

/// What a token is minted for: the claim-bearing part of an identity.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenSubject {
    pub login_id: String,
    pub role: Role,
    pub token_version: u64,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AuthenticatedIdentity {
    pub id: IdentityId,
    pub login_id: String,
    pub role: Role,
    pub token_version: u64,
}
