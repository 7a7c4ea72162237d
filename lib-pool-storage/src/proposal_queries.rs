//! Swap proposals, votes and the transaction ledger

use lib_pool_types::{ProposalStatus, SwapProposal, Transaction, TransactionStatus, Vote, VoteChoice};

use crate::errors::{StorageError, StorageResult};
use crate::records::{NewProposal, NewTransaction, SettlementUpdate};
use crate::rows::{convert_all, new_id, now_millis, ProposalRow, TransactionRow, VoteRow};
use crate::store::StoreTx;

const PROPOSAL_SELECT: &str = r#"
    SELECT s.id, s.pool_id, s.proposer_id, u.wallet_address AS proposer_address,
           s.from_token, s.to_token, s.amount, s.min_received, s.status,
           s.created_at, s.executed_at, s.transaction_id, s.error_message
    FROM swap_proposals s
    JOIN users u ON u.id = s.proposer_id
"#;

const VOTE_SELECT: &str = r#"
    SELECT v.id, v.proposal_id, v.user_id, u.wallet_address AS voter_address,
           v.vote, v.created_at
    FROM votes v
    JOIN users u ON u.id = v.user_id
"#;

impl StoreTx {
    // ========================================================================
    // Proposals
    // ========================================================================

    /// Insert a proposal in `PENDING`
    pub async fn insert_proposal(&mut self, proposal: &NewProposal) -> StorageResult<SwapProposal> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO swap_proposals
                (id, pool_id, proposer_id, from_token, to_token, amount, min_received,
                 status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&proposal.pool_id)
        .bind(&proposal.proposer_id)
        .bind(&proposal.from_token)
        .bind(&proposal.to_token)
        .bind(&proposal.amount)
        .bind(&proposal.min_received)
        .bind(ProposalStatus::Pending.as_str())
        .bind(now_millis())
        .execute(&mut *self.tx)
        .await?;

        let proposal = self.find_proposal(&id).await?;
        proposal.ok_or_else(|| StorageError::corrupt("swap_proposals", "inserted row vanished"))
    }

    /// Get a proposal by id
    pub async fn find_proposal(&mut self, proposal_id: &str) -> StorageResult<Option<SwapProposal>> {
        let row = sqlx::query_as::<_, ProposalRow>(&format!("{PROPOSAL_SELECT} WHERE s.id = ?"))
            .bind(proposal_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(SwapProposal::try_from).transpose()
    }

    /// Proposals of a pool, newest first
    pub async fn list_proposals(&mut self, pool_id: &str) -> StorageResult<Vec<SwapProposal>> {
        let rows = sqlx::query_as::<_, ProposalRow>(&format!(
            "{PROPOSAL_SELECT} WHERE s.pool_id = ? ORDER BY s.created_at DESC, s.rowid DESC"
        ))
        .bind(pool_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    /// Move a proposal from `from` to `to`
    ///
    /// Returns false when the stored status no longer equals `from`.
    pub async fn update_proposal_status(
        &mut self,
        proposal_id: &str,
        from: ProposalStatus,
        to: ProposalStatus,
        error_message: Option<&str>,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE swap_proposals
            SET status = ?, error_message = COALESCE(?, error_message)
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to.as_str())
        .bind(error_message)
        .bind(proposal_id)
        .bind(from.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Close out an approved proposal and link its swap transaction
    ///
    /// `outcome` is `EXECUTED` or `FAILED`. Applies only while the proposal is
    /// still `APPROVED` and unlinked; returns false otherwise.
    pub async fn record_execution(
        &mut self,
        proposal_id: &str,
        transaction_id: &str,
        outcome: ProposalStatus,
        error_message: Option<&str>,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE swap_proposals
            SET status = ?, executed_at = ?, transaction_id = ?,
                error_message = COALESCE(?, error_message)
            WHERE id = ? AND status = ? AND transaction_id IS NULL
            "#,
        )
        .bind(outcome.as_str())
        .bind(now_millis())
        .bind(transaction_id)
        .bind(error_message)
        .bind(proposal_id)
        .bind(ProposalStatus::Approved.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every proposal of a pool together with its votes
    pub async fn delete_proposals_for_pool(&mut self, pool_id: &str) -> StorageResult<u64> {
        sqlx::query(
            "DELETE FROM votes WHERE proposal_id IN (SELECT id FROM swap_proposals WHERE pool_id = ?)",
        )
        .bind(pool_id)
        .execute(&mut *self.tx)
        .await?;

        let result = sqlx::query("DELETE FROM swap_proposals WHERE pool_id = ?")
            .bind(pool_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    // ========================================================================
    // Votes
    // ========================================================================

    /// Record a ballot, replacing the voter's earlier choice on the same proposal
    pub async fn upsert_vote(
        &mut self,
        proposal_id: &str,
        user_id: &str,
        choice: VoteChoice,
    ) -> StorageResult<Vote> {
        sqlx::query(
            r#"
            INSERT INTO votes (id, proposal_id, user_id, vote, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(proposal_id, user_id) DO UPDATE SET vote = excluded.vote
            "#,
        )
        .bind(new_id())
        .bind(proposal_id)
        .bind(user_id)
        .bind(choice.as_str())
        .bind(now_millis())
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, VoteRow>(&format!(
            "{VOTE_SELECT} WHERE v.proposal_id = ? AND v.user_id = ?"
        ))
        .bind(proposal_id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        row.try_into()
    }

    /// Ballots on a proposal in the order they were first cast
    pub async fn list_votes(&mut self, proposal_id: &str) -> StorageResult<Vec<Vote>> {
        let rows = sqlx::query_as::<_, VoteRow>(&format!(
            "{VOTE_SELECT} WHERE v.proposal_id = ? ORDER BY v.created_at ASC, v.rowid ASC"
        ))
        .bind(proposal_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Append a ledger entry
    ///
    /// Terminal entries get `executed_at` set at insert time.
    pub async fn insert_transaction(&mut self, entry: &NewTransaction) -> StorageResult<Transaction> {
        let id = new_id();
        let now = now_millis();
        let executed_at = entry.status.is_terminal().then_some(now);

        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, pool_id, proposal_id, type, status, from_token, to_token, amount,
                 error_message, created_at, executed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&entry.pool_id)
        .bind(&entry.proposal_id)
        .bind(entry.tx_type.as_str())
        .bind(entry.status.as_str())
        .bind(&entry.from_token)
        .bind(&entry.to_token)
        .bind(&entry.amount)
        .bind(&entry.error_message)
        .bind(now)
        .bind(executed_at)
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    /// Get a ledger entry by id
    pub async fn find_transaction(&mut self, transaction_id: &str) -> StorageResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = ?")
            .bind(transaction_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Transaction::try_from).transpose()
    }

    /// Ledger of a pool, newest first
    pub async fn list_transactions(&mut self, pool_id: &str) -> StorageResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE pool_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(pool_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    /// Write the settlement outcome to a transaction that is still `PENDING`
    ///
    /// Returns the updated entry, or `None` if it was already terminal or gone.
    pub async fn settle_transaction(
        &mut self,
        transaction_id: &str,
        update: &SettlementUpdate,
    ) -> StorageResult<Option<Transaction>> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = ?, tx_hash = ?, gas_used = ?, gas_price = ?,
                error_message = ?, executed_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(update.status.as_str())
        .bind(&update.tx_hash)
        .bind(&update.gas_used)
        .bind(&update.gas_price)
        .bind(&update.error_message)
        .bind(now_millis())
        .bind(transaction_id)
        .bind(TransactionStatus::Pending.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_transaction(transaction_id).await
    }

    /// Delete every ledger entry of a pool
    pub async fn delete_transactions_for_pool(&mut self, pool_id: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE pool_id = ?")
            .bind(pool_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use lib_pool_types::{MemberRole, PoolVisibility, TransactionType};

    use crate::records::NewPool;
    use crate::store::SqliteStore;

    use super::*;

    struct Fixture {
        store: SqliteStore,
        pool_id: String,
        proposer_id: String,
    }

    async fn fixture() -> Fixture {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let proposer = tx.find_or_create_user("0xproposer").await.unwrap();
        let pool = tx
            .insert_pool(&NewPool {
                name: "Pool".into(),
                description: None,
                multisig_address: "0xmultisig".into(),
                creator_id: proposer.id.clone(),
                visibility: PoolVisibility::Public,
                join_code: None,
                required_signatures: 1,
            })
            .await
            .unwrap();
        tx.insert_member(&pool.id, &proposer.id, MemberRole::Creator).await.unwrap();
        tx.commit().await.unwrap();

        Fixture {
            store,
            pool_id: pool.id,
            proposer_id: proposer.id,
        }
    }

    fn new_proposal(f: &Fixture) -> NewProposal {
        NewProposal {
            pool_id: f.pool_id.clone(),
            proposer_id: f.proposer_id.clone(),
            from_token: "ETH".into(),
            to_token: "USDT".into(),
            amount: "1.5".into(),
            min_received: "3000".into(),
        }
    }

    fn swap_entry(f: &Fixture, proposal_id: &str) -> NewTransaction {
        NewTransaction {
            pool_id: f.pool_id.clone(),
            proposal_id: Some(proposal_id.to_string()),
            tx_type: TransactionType::Swap,
            status: TransactionStatus::Pending,
            from_token: Some("ETH".into()),
            to_token: Some("USDT".into()),
            amount: Some("1.5".into()),
            error_message: None,
        }
    }

    #[tokio::test]
    async fn new_proposal_starts_pending_with_proposer_address() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();

        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();

        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.proposer_address, "0xproposer");
        assert!(proposal.transaction_id.is_none());
        assert!(proposal.executed_at.is_none());
    }

    #[tokio::test]
    async fn status_update_is_conditional_on_current_status() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();
        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();

        assert!(tx
            .update_proposal_status(&proposal.id, ProposalStatus::Pending, ProposalStatus::Approved, None)
            .await
            .unwrap());
        assert!(!tx
            .update_proposal_status(&proposal.id, ProposalStatus::Pending, ProposalStatus::Rejected, None)
            .await
            .unwrap());

        let loaded = tx.find_proposal(&proposal.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ProposalStatus::Approved);
    }

    #[tokio::test]
    async fn revote_replaces_previous_choice() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();
        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();

        let first = tx.upsert_vote(&proposal.id, &f.proposer_id, VoteChoice::Against).await.unwrap();
        let second = tx.upsert_vote(&proposal.id, &f.proposer_id, VoteChoice::For).await.unwrap();

        assert_eq!(first.id, second.id);
        let votes = tx.list_votes(&proposal.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote, VoteChoice::For);
        assert_eq!(votes[0].voter_address, "0xproposer");
    }

    #[tokio::test]
    async fn execution_is_recorded_once() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();
        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();
        tx.update_proposal_status(&proposal.id, ProposalStatus::Pending, ProposalStatus::Approved, None)
            .await
            .unwrap();

        let entry = tx.insert_transaction(&swap_entry(&f, &proposal.id)).await.unwrap();
        assert!(entry.executed_at.is_none());
        assert!(tx
            .record_execution(&proposal.id, &entry.id, ProposalStatus::Executed, None)
            .await
            .unwrap());
        assert!(!tx
            .record_execution(&proposal.id, &entry.id, ProposalStatus::Executed, None)
            .await
            .unwrap());

        let loaded = tx.find_proposal(&proposal.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ProposalStatus::Executed);
        assert_eq!(loaded.transaction_id.as_deref(), Some(entry.id.as_str()));
        assert!(loaded.executed_at.is_some());
    }

    #[tokio::test]
    async fn second_swap_entry_for_a_proposal_is_rejected() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();
        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();

        tx.insert_transaction(&swap_entry(&f, &proposal.id)).await.unwrap();
        let err = tx.insert_transaction(&swap_entry(&f, &proposal.id)).await.unwrap_err();

        assert!(matches!(err, StorageError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn settlement_only_applies_to_pending_entries() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();
        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();
        let entry = tx.insert_transaction(&swap_entry(&f, &proposal.id)).await.unwrap();

        let update = SettlementUpdate {
            status: TransactionStatus::Success,
            tx_hash: Some("0xhash".into()),
            gas_used: Some("21000".into()),
            gas_price: Some("20".into()),
            error_message: None,
        };

        let settled = tx.settle_transaction(&entry.id, &update).await.unwrap().unwrap();
        assert_eq!(settled.status, TransactionStatus::Success);
        assert_eq!(settled.tx_hash.as_deref(), Some("0xhash"));
        assert!(settled.executed_at.is_some());

        let again = tx.settle_transaction(&entry.id, &update).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn pool_children_can_be_removed_in_order() {
        let f = fixture().await;
        let mut tx = f.store.begin().await.unwrap();
        let proposal = tx.insert_proposal(&new_proposal(&f)).await.unwrap();
        tx.upsert_vote(&proposal.id, &f.proposer_id, VoteChoice::For).await.unwrap();
        tx.insert_transaction(&NewTransaction::event(&f.pool_id, TransactionType::PoolCreation))
            .await
            .unwrap();

        assert_eq!(tx.delete_proposals_for_pool(&f.pool_id).await.unwrap(), 1);
        assert_eq!(tx.delete_transactions_for_pool(&f.pool_id).await.unwrap(), 1);
        assert_eq!(tx.delete_members_for_pool(&f.pool_id).await.unwrap(), 1);
        assert_eq!(tx.delete_tokens_for_pool(&f.pool_id).await.unwrap(), 0);
        assert!(tx.delete_pool(&f.pool_id).await.unwrap());

        assert!(tx.find_proposal(&proposal.id).await.unwrap().is_none());
        assert!(tx.list_votes(&proposal.id).await.unwrap().is_empty());
    }
}
