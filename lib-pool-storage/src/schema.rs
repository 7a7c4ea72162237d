//! Embedded schema
//!
//! Timestamps are unix milliseconds. Enum columns hold the upper-case names
//! used on the wire. Insert order (rowid) breaks timestamp ties in listings.

pub(crate) const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    wallet_address TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS pools (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    multisig_address TEXT NOT NULL,
    creator_id TEXT NOT NULL REFERENCES users(id),
    visibility TEXT NOT NULL,
    join_code TEXT,
    required_signatures INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS pool_members (
    id TEXT PRIMARY KEY,
    pool_id TEXT NOT NULL REFERENCES pools(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    role TEXT NOT NULL,
    joined_at INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_members_one_active
    ON pool_members(pool_id, user_id) WHERE is_active = 1;
CREATE INDEX IF NOT EXISTS idx_members_pool ON pool_members(pool_id);
CREATE INDEX IF NOT EXISTS idx_members_user ON pool_members(user_id);

CREATE TABLE IF NOT EXISTS pool_tokens (
    id TEXT PRIMARY KEY,
    pool_id TEXT NOT NULL REFERENCES pools(id),
    symbol TEXT NOT NULL,
    address TEXT,
    decimals INTEGER NOT NULL,
    balance TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (pool_id, symbol)
);

CREATE TABLE IF NOT EXISTS swap_proposals (
    id TEXT PRIMARY KEY,
    pool_id TEXT NOT NULL REFERENCES pools(id),
    proposer_id TEXT NOT NULL REFERENCES users(id),
    from_token TEXT NOT NULL,
    to_token TEXT NOT NULL,
    amount TEXT NOT NULL,
    min_received TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    created_at INTEGER NOT NULL,
    executed_at INTEGER,
    transaction_id TEXT UNIQUE REFERENCES transactions(id) ON DELETE SET NULL,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_proposals_pool ON swap_proposals(pool_id);
CREATE INDEX IF NOT EXISTS idx_proposals_status ON swap_proposals(status);

CREATE TABLE IF NOT EXISTS votes (
    id TEXT PRIMARY KEY,
    proposal_id TEXT NOT NULL REFERENCES swap_proposals(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id),
    vote TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (proposal_id, user_id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    pool_id TEXT NOT NULL REFERENCES pools(id),
    proposal_id TEXT REFERENCES swap_proposals(id) ON DELETE SET NULL,
    type TEXT NOT NULL,
    status TEXT NOT NULL,
    from_token TEXT,
    to_token TEXT,
    amount TEXT,
    tx_hash TEXT,
    gas_used TEXT,
    gas_price TEXT,
    error_message TEXT,
    created_at INTEGER NOT NULL,
    executed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_transactions_pool ON transactions(pool_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_one_swap_per_proposal
    ON transactions(proposal_id) WHERE type = 'SWAP' AND proposal_id IS NOT NULL;
"#;
