//! Pool membership: joining, listing and leaving

use lib_pool_storage::{NewTransaction, StorageError};
use lib_pool_types::{MemberRole, PoolMember, TransactionType};
use serde::Serialize;
use tracing::info;

use crate::errors::{require, PoolError, PoolResult};
use crate::lifecycle::cascade_delete;
use crate::service::SwapPoolService;

/// Outcome of leaving a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRemoval {
    pub pool_id: String,
    /// The leaver was the last active member and the pool is gone
    pub pool_deleted: bool,
}

impl SwapPoolService {
    /// Join a pool as a regular member
    pub async fn add_member(
        &self,
        pool_id: &str,
        user_address: &str,
        join_code: Option<&str>,
    ) -> PoolResult<PoolMember> {
        require("userAddress", user_address)?;

        let mut tx = self.store.begin().await?;
        let pool = tx
            .find_pool(pool_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Pool {pool_id}")))?;

        if !pool.accepts_join_code(join_code) {
            return Err(PoolError::Unauthorized("invalid join code".to_string()));
        }

        let user = tx.find_or_create_user(user_address).await?;
        if tx.find_active_member(pool_id, &user.id).await?.is_some() {
            return Err(PoolError::Conflict(
                "user is already a member of this pool".to_string(),
            ));
        }

        let member = match tx.insert_member(pool_id, &user.id, MemberRole::Member).await {
            Ok(member) => member,
            Err(StorageError::UniqueViolation(_)) => {
                return Err(PoolError::Conflict(
                    "user is already a member of this pool".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        info!("{} joined pool {}", user_address, pool_id);
        Ok(member)
    }

    /// Active members, oldest first
    pub async fn list_active_members(&self, pool_id: &str) -> PoolResult<Vec<PoolMember>> {
        let mut tx = self.store.read().await?;
        if tx.find_pool(pool_id).await?.is_none() {
            return Err(PoolError::not_found(format!("Pool {pool_id}")));
        }
        Ok(tx.list_active_members(pool_id).await?)
    }

    /// Leave a pool
    ///
    /// The creator may leave only as the last active member. Whoever leaves
    /// last takes the pool with them.
    pub async fn remove_member(&self, pool_id: &str, user_address: &str) -> PoolResult<MemberRemoval> {
        require("userAddress", user_address)?;

        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_address(user_address)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("User {user_address}")))?;
        let pool = tx
            .find_pool(pool_id)
            .await?
            .ok_or_else(|| PoolError::not_found(format!("Pool {pool_id}")))?;

        let membership = tx
            .find_active_member(pool_id, &user.id)
            .await?
            .ok_or_else(|| PoolError::InvalidState("user is not a member of this pool".to_string()))?;

        let active = tx.count_active_members(pool_id).await?;
        if pool.creator_id == user.id && active > 1 {
            return Err(PoolError::InvalidState(
                "pool creator cannot leave while other members are present; delete the pool instead"
                    .to_string(),
            ));
        }

        tx.deactivate_member(&membership.id).await?;
        tx.insert_transaction(&NewTransaction::event(pool_id, TransactionType::Withdrawal))
            .await?;

        let pool_deleted = tx.count_active_members(pool_id).await? == 0;
        if pool_deleted {
            cascade_delete(&mut tx, pool_id).await?;
        }
        tx.commit().await?;

        if pool_deleted {
            info!("{} left pool {} as last member; pool deleted", user_address, pool_id);
        } else {
            info!("{} left pool {}", user_address, pool_id);
        }

        Ok(MemberRemoval {
            pool_id: pool_id.to_string(),
            pool_deleted,
        })
    }
}
