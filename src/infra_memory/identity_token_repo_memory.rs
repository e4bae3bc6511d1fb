use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// Process-local identity store. Each compare-and-swap runs under the
/// shard write lock of the identity's entry.
#[derive(Default)]
pub struct MemoryIdentityTokenRepo {
    identities: DashMap<IdentityId, IdentityRecord>,
    login_index: DashMap<String, IdentityId>,
}

impl MemoryIdentityTokenRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: IdentityRecord) {
        self.login_index.insert(record.login_id.clone(), record.id);
        self.identities.insert(record.id, record);
    }

    pub fn set_active(&self, id: IdentityId, active: ActiveStatus) -> bool {
        match self.identities.get_mut(&id) {
            Some(mut record) => {
                record.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl IdentityTokenRepo for MemoryIdentityTokenRepo {
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<IdentityRecord>, AuthError> {
        Ok(self.identities.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_login_id(
        &self,
        login_id: &str,
    ) -> Result<Option<IdentityRecord>, AuthError> {
        let id = match self.login_index.get(login_id) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        self.find_by_id(id).await
    }

    async fn compare_and_swap(
        &self,
        id: IdentityId,
        expected: &TokenState,
        next: &TokenState,
    ) -> Result<bool, AuthError> {
        let Some(mut record) = self.identities.get_mut(&id) else {
            return Ok(false);
        };
        if record.token_state != *expected {
            return Ok(false);
        }
        record.token_state = next.clone();
        Ok(true)
    }

    async fn revoke(&self, id: IdentityId) -> Result<Option<TokenState>, AuthError> {
        let Some(mut record) = self.identities.get_mut(&id) else {
            return Ok(None);
        };
        let token_version = record
            .token_state
            .token_version
            .checked_add(1)
            .ok_or_else(|| AuthError::Store(format!("token version exhausted for {}", id)))?;
        record.token_state = TokenState {
            token_version,
            encrypted_refresh_token: None,
        };
        Ok(Some(record.token_state.clone()))
    }
}
