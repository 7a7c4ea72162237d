//! Pool lifecycle: creation, lookup and deletion

use lib_pool_storage::{NewPool, NewTransaction, StoreTx};
use lib_pool_types::{MemberRole, Pool, PoolSummary, PoolVisibility, TransactionType};
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{require, PoolError, PoolResult};
use crate::service::SwapPoolService;

/// Parameters for a new pool
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub multisig_address: String,
    pub creator_address: String,
    /// Initial members; the creator is a member only if listed here
    pub members: Vec<String>,
    pub required_signatures: u32,
    #[serde(default)]
    pub visibility: PoolVisibility,
    #[serde(default)]
    pub join_code: Option<String>,
}

impl CreatePoolRequest {
    fn validate(&self) -> PoolResult<()> {
        require("name", &self.name)?;
        require("multisigAddress", &self.multisig_address)?;
        require("creatorAddress", &self.creator_address)?;
        if self.members.is_empty() {
            return Err(PoolError::InvalidInput("members is required".to_string()));
        }
        for member in &self.members {
            require("member address", member)?;
        }
        if self.required_signatures == 0 {
            return Err(PoolError::InvalidInput(
                "requiredSignatures must be at least 1".to_string(),
            ));
        }
        if self.visibility == PoolVisibility::Private
            && self.join_code.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(PoolError::InvalidInput(
                "joinCode is required for private pools".to_string(),
            ));
        }
        Ok(())
    }

    /// Member addresses in first-seen order without repeats
    fn distinct_members(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.members.len());
        for member in &self.members {
            if !seen.contains(&member.as_str()) {
                seen.push(member.as_str());
            }
        }
        seen
    }
}

impl SwapPoolService {
    /// Create a pool, its initial memberships and a `POOL_CREATION` entry
    pub async fn create_pool(&self, request: CreatePoolRequest) -> PoolResult<Pool> {
        request.validate()?;

        let mut tx = self.store.begin().await?;
        let creator = tx.find_or_create_user(&request.creator_address).await?;

        let pool = tx
            .insert_pool(&NewPool {
                name: request.name.clone(),
                description: request.description.clone(),
                multisig_address: request.multisig_address.clone(),
                creator_id: creator.id.clone(),
                visibility: request.visibility,
                join_code: request.join_code.clone(),
                required_signatures: request.required_signatures,
            })
            .await?;

        for address in request.distinct_members() {
            let user = tx.find_or_create_user(address).await?;
            let role = if address == request.creator_address {
                MemberRole::Creator
            } else {
                MemberRole::Member
            };
            tx.insert_member(&pool.id, &user.id, role).await?;
        }

        tx.insert_transaction(&NewTransaction::event(&pool.id, TransactionType::PoolCreation))
            .await?;
        tx.commit().await?;

        info!(
            "Pool {} ({}) created by {} with {} members",
            pool.id,
            pool.name,
            request.creator_address,
            request.distinct_members().len()
        );
        Ok(pool)
    }

    /// Pool with its active member and pending proposal counts
    pub async fn get_pool(&self, pool_id: &str) -> PoolResult<PoolSummary> {
        let mut tx = self.store.read().await?;
        tx.pool_summary(pool_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Pool {pool_id}")))
    }

    /// Pools where the wallet holds an active membership
    pub async fn list_pools_for_user(&self, user_address: &str) -> PoolResult<Vec<PoolSummary>> {
        require("userAddress", user_address)?;

        let mut tx = self.store.read().await?;
        match tx.find_user_by_address(user_address).await? {
            Some(user) => Ok(tx.list_pools_for_user(&user.id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Delete a pool on behalf of its creator
    ///
    /// Allowed only while the creator is the sole active member.
    pub async fn delete_pool(&self, pool_id: &str, user_address: &str) -> PoolResult<()> {
        require("userAddress", user_address)?;

        let mut tx = self.store.begin().await?;
        let pool = tx
            .find_pool(pool_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Pool {pool_id}")))?;
        let user = tx
            .find_user_by_address(user_address)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("User {user_address}")))?;

        if pool.creator_id != user.id {
            return Err(PoolError::Unauthorized(
                "only the pool creator can delete the pool".to_string(),
            ));
        }

        let is_member = tx.find_active_member(pool_id, &user.id).await?.is_some();
        let active = tx.count_active_members(pool_id).await?;
        if !is_member || active != 1 {
            return Err(PoolError::InvalidState(
                "pool can only be deleted when the creator is its only active member".to_string(),
            ));
        }

        cascade_delete(&mut tx, pool_id).await?;
        tx.commit().await?;

        info!("Pool {} deleted by creator {}", pool_id, user_address);
        Ok(())
    }
}

/// Remove a pool and everything that hangs off it
pub(crate) async fn cascade_delete(tx: &mut StoreTx, pool_id: &str) -> PoolResult<()> {
    let proposals = tx.delete_proposals_for_pool(pool_id).await?;
    let transactions = tx.delete_transactions_for_pool(pool_id).await?;
    let members = tx.delete_members_for_pool(pool_id).await?;
    let tokens = tx.delete_tokens_for_pool(pool_id).await?;
    tx.delete_pool(pool_id).await?;

    debug!(
        "Cascade delete of pool {}: {} proposals, {} transactions, {} memberships, {} tokens",
        pool_id, proposals, transactions, members, tokens
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreatePoolRequest {
        CreatePoolRequest {
            name: "Pool".into(),
            description: None,
            multisig_address: "0xmultisig".into(),
            creator_address: "0xa".into(),
            members: vec!["0xa".into(), "0xb".into(), "0xa".into()],
            required_signatures: 2,
            visibility: PoolVisibility::Public,
            join_code: None,
        }
    }

    #[test]
    fn duplicate_members_are_collapsed() {
        assert_eq!(request().distinct_members(), vec!["0xa", "0xb"]);
    }

    #[test]
    fn validation_rejects_missing_fields() {
        assert!(request().validate().is_ok());

        let mut r = request();
        r.members.clear();
        assert!(matches!(r.validate(), Err(PoolError::InvalidInput(_))));

        let mut r = request();
        r.required_signatures = 0;
        assert!(matches!(r.validate(), Err(PoolError::InvalidInput(_))));

        let mut r = request();
        r.multisig_address = String::new();
        assert!(matches!(r.validate(), Err(PoolError::InvalidInput(_))));
    }

    #[test]
    fn private_pool_needs_join_code() {
        let mut r = request();
        r.visibility = PoolVisibility::Private;
        assert!(matches!(r.validate(), Err(PoolError::InvalidInput(_))));

        r.join_code = Some("secret".into());
        assert!(r.validate().is_ok());
    }
}
