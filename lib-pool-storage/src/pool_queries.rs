//! Users, pools, memberships and token balances

use lib_pool_types::{MemberRole, Pool, PoolMember, PoolSummary, PoolToken, User};

use crate::errors::StorageResult;
use crate::records::{NewPool, NewToken};
use crate::rows::{
    convert_all, new_id, now_millis, MemberRow, PoolRow, PoolSummaryRow, TokenRow, UserRow,
};
use crate::store::StoreTx;

const MEMBER_SELECT: &str = r#"
    SELECT m.id, m.pool_id, m.user_id, u.wallet_address, m.role, m.joined_at, m.is_active
    FROM pool_members m
    JOIN users u ON u.id = m.user_id
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT p.*,
        (SELECT COUNT(*) FROM pool_members m
            WHERE m.pool_id = p.id AND m.is_active = 1) AS member_count,
        (SELECT COUNT(*) FROM swap_proposals s
            WHERE s.pool_id = p.id AND s.status = 'PENDING') AS pending_swaps
    FROM pools p
"#;

impl StoreTx {
    // ========================================================================
    // Users
    // ========================================================================

    /// Find a user by wallet address
    pub async fn find_user_by_address(&mut self, wallet_address: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE wallet_address = ?")
            .bind(wallet_address)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// Return the user for `wallet_address`, creating it on first reference
    pub async fn find_or_create_user(&mut self, wallet_address: &str) -> StorageResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, wallet_address, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(wallet_address) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(wallet_address)
        .bind(now_millis())
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE wallet_address = ?")
            .bind(wallet_address)
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    // ========================================================================
    // Pools
    // ========================================================================

    /// Insert a new pool
    pub async fn insert_pool(&mut self, pool: &NewPool) -> StorageResult<Pool> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO pools
                (id, name, description, multisig_address, creator_id,
                 visibility, join_code, required_signatures, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&pool.name)
        .bind(&pool.description)
        .bind(&pool.multisig_address)
        .bind(&pool.creator_id)
        .bind(pool.visibility.as_str())
        .bind(&pool.join_code)
        .bind(i64::from(pool.required_signatures))
        .bind(now_millis())
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, PoolRow>("SELECT * FROM pools WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    /// Get a pool by id
    pub async fn find_pool(&mut self, pool_id: &str) -> StorageResult<Option<Pool>> {
        let row = sqlx::query_as::<_, PoolRow>("SELECT * FROM pools WHERE id = ?")
            .bind(pool_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Pool::try_from).transpose()
    }

    /// Get a pool with its active member and pending proposal counts
    pub async fn pool_summary(&mut self, pool_id: &str) -> StorageResult<Option<PoolSummary>> {
        let row = sqlx::query_as::<_, PoolSummaryRow>(&format!("{SUMMARY_SELECT} WHERE p.id = ?"))
            .bind(pool_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(PoolSummary::try_from).transpose()
    }

    /// Pools in which `user_id` holds an active membership, newest membership first
    pub async fn list_pools_for_user(&mut self, user_id: &str) -> StorageResult<Vec<PoolSummary>> {
        let rows = sqlx::query_as::<_, PoolSummaryRow>(&format!(
            "{SUMMARY_SELECT}
             JOIN pool_members um ON um.pool_id = p.id
             WHERE um.user_id = ? AND um.is_active = 1
             ORDER BY um.joined_at DESC, um.rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    /// Delete the pool row only; children must already be gone
    pub async fn delete_pool(&mut self, pool_id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM pools WHERE id = ?")
            .bind(pool_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Memberships
    // ========================================================================

    /// Insert an active membership
    ///
    /// Fails with `UniqueViolation` if the user already holds an active
    /// membership in the pool.
    pub async fn insert_member(
        &mut self,
        pool_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> StorageResult<PoolMember> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO pool_members (id, pool_id, user_id, role, joined_at, is_active)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&id)
        .bind(pool_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(now_millis())
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, MemberRow>(&format!("{MEMBER_SELECT} WHERE m.id = ?"))
            .bind(&id)
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    /// The user's active membership in the pool, if any
    pub async fn find_active_member(
        &mut self,
        pool_id: &str,
        user_id: &str,
    ) -> StorageResult<Option<PoolMember>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "{MEMBER_SELECT} WHERE m.pool_id = ? AND m.user_id = ? AND m.is_active = 1"
        ))
        .bind(pool_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(PoolMember::try_from).transpose()
    }

    /// Active members, oldest first
    pub async fn list_active_members(&mut self, pool_id: &str) -> StorageResult<Vec<PoolMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "{MEMBER_SELECT} WHERE m.pool_id = ? AND m.is_active = 1
             ORDER BY m.joined_at ASC, m.rowid ASC"
        ))
        .bind(pool_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    /// Number of active members
    pub async fn count_active_members(&mut self, pool_id: &str) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pool_members WHERE pool_id = ? AND is_active = 1",
        )
        .bind(pool_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count.max(0) as u64)
    }

    /// Soft-delete a membership
    pub async fn deactivate_member(&mut self, member_id: &str) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE pool_members SET is_active = 0 WHERE id = ? AND is_active = 1")
            .bind(member_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete every membership row of a pool, active or not
    pub async fn delete_members_for_pool(&mut self, pool_id: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM pool_members WHERE pool_id = ?")
            .bind(pool_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Insert a token balance or overwrite the existing one for the same symbol
    pub async fn upsert_token(&mut self, token: &NewToken) -> StorageResult<PoolToken> {
        sqlx::query(
            r#"
            INSERT INTO pool_tokens (id, pool_id, symbol, address, decimals, balance, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(pool_id, symbol) DO UPDATE SET
                address = excluded.address,
                decimals = excluded.decimals,
                balance = excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(new_id())
        .bind(&token.pool_id)
        .bind(&token.symbol)
        .bind(&token.address)
        .bind(i64::from(token.decimals))
        .bind(&token.balance)
        .bind(now_millis())
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT * FROM pool_tokens WHERE pool_id = ? AND symbol = ?",
        )
        .bind(&token.pool_id)
        .bind(&token.symbol)
        .fetch_one(&mut *self.tx)
        .await?;

        row.try_into()
    }

    /// Token balances, most recently updated first
    pub async fn list_tokens(&mut self, pool_id: &str) -> StorageResult<Vec<PoolToken>> {
        let rows = sqlx::query_as::<_, TokenRow>(
            "SELECT * FROM pool_tokens WHERE pool_id = ? ORDER BY updated_at DESC, rowid DESC",
        )
        .bind(pool_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    /// Delete every token balance of a pool
    pub async fn delete_tokens_for_pool(&mut self, pool_id: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM pool_tokens WHERE pool_id = ?")
            .bind(pool_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use lib_pool_types::PoolVisibility;

    use crate::errors::StorageError;
    use crate::store::SqliteStore;

    use super::*;

    async fn store_with_pool() -> (SqliteStore, Pool, User) {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let creator = tx.find_or_create_user("0xcreator").await.unwrap();
        let pool = tx
            .insert_pool(&NewPool {
                name: "Weekend Traders".into(),
                description: Some("test pool".into()),
                multisig_address: "0xmultisig".into(),
                creator_id: creator.id.clone(),
                visibility: PoolVisibility::Public,
                join_code: None,
                required_signatures: 2,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (store, pool, creator)
    }

    #[tokio::test]
    async fn find_or_create_user_is_idempotent() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();

        let first = tx.find_or_create_user("0xabc").await.unwrap();
        let second = tx.find_or_create_user("0xabc").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.wallet_address, "0xabc");
    }

    #[tokio::test]
    async fn pool_round_trips_through_store() {
        let (store, pool, creator) = store_with_pool().await;
        let mut tx = store.read().await.unwrap();

        let loaded = tx.find_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(loaded, pool);
        assert_eq!(loaded.creator_id, creator.id);
        assert_eq!(loaded.required_signatures, 2);
    }

    #[tokio::test]
    async fn second_active_membership_is_rejected() {
        let (store, pool, creator) = store_with_pool().await;
        let mut tx = store.begin().await.unwrap();

        tx.insert_member(&pool.id, &creator.id, MemberRole::Creator).await.unwrap();
        let err = tx
            .insert_member(&pool.id, &creator.id, MemberRole::Member)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn deactivated_member_can_rejoin_and_is_not_counted() {
        let (store, pool, creator) = store_with_pool().await;
        let mut tx = store.begin().await.unwrap();

        let member = tx.insert_member(&pool.id, &creator.id, MemberRole::Creator).await.unwrap();
        assert_eq!(tx.count_active_members(&pool.id).await.unwrap(), 1);

        assert!(tx.deactivate_member(&member.id).await.unwrap());
        assert!(!tx.deactivate_member(&member.id).await.unwrap());
        assert_eq!(tx.count_active_members(&pool.id).await.unwrap(), 0);
        assert!(tx.find_active_member(&pool.id, &creator.id).await.unwrap().is_none());

        tx.insert_member(&pool.id, &creator.id, MemberRole::Member).await.unwrap();
        assert_eq!(tx.count_active_members(&pool.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn active_members_are_listed_oldest_first() {
        let (store, pool, creator) = store_with_pool().await;
        let mut tx = store.begin().await.unwrap();

        tx.insert_member(&pool.id, &creator.id, MemberRole::Creator).await.unwrap();
        for addr in ["0xb", "0xc"] {
            let user = tx.find_or_create_user(addr).await.unwrap();
            tx.insert_member(&pool.id, &user.id, MemberRole::Member).await.unwrap();
        }

        let members = tx.list_active_members(&pool.id).await.unwrap();
        let addresses: Vec<_> = members.iter().map(|m| m.wallet_address.as_str()).collect();
        assert_eq!(addresses, vec!["0xcreator", "0xb", "0xc"]);
        assert_eq!(members[0].role, MemberRole::Creator);
    }

    #[tokio::test]
    async fn token_upsert_overwrites_by_symbol() {
        let (store, pool, _) = store_with_pool().await;
        let mut tx = store.begin().await.unwrap();

        let first = tx
            .upsert_token(&NewToken {
                pool_id: pool.id.clone(),
                symbol: "USDT".into(),
                address: None,
                decimals: 6,
                balance: "100".into(),
            })
            .await
            .unwrap();
        let second = tx
            .upsert_token(&NewToken {
                pool_id: pool.id.clone(),
                symbol: "USDT".into(),
                address: Some("0xusdt".into()),
                decimals: 6,
                balance: "250.5".into(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.balance, "250.5");
        assert_eq!(second.address.as_deref(), Some("0xusdt"));
        assert_eq!(tx.list_tokens(&pool.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn summary_counts_only_active_members() {
        let (store, pool, creator) = store_with_pool().await;
        let mut tx = store.begin().await.unwrap();

        tx.insert_member(&pool.id, &creator.id, MemberRole::Creator).await.unwrap();
        let other = tx.find_or_create_user("0xother").await.unwrap();
        let membership = tx.insert_member(&pool.id, &other.id, MemberRole::Member).await.unwrap();
        tx.deactivate_member(&membership.id).await.unwrap();

        let summary = tx.pool_summary(&pool.id).await.unwrap().unwrap();
        assert_eq!(summary.member_count, 1);
        assert_eq!(summary.pending_swaps, 0);

        let pools = tx.list_pools_for_user(&other.id).await.unwrap();
        assert!(pools.is_empty());
        let pools = tx.list_pools_for_user(&creator.id).await.unwrap();
        assert_eq!(pools.len(), 1);
    }
}
