//! HTTP API tests
//!
//! Each test starts the router on an ephemeral port backed by an in-memory
//! store and the simulated DEX.

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use swap_pool_node::config::DexMode;
use swap_pool_node::{api, node, NodeConfig};

struct TestNode {
    base: String,
    http: reqwest::Client,
}

impl TestNode {
    async fn start() -> Result<Self> {
        let mut config = NodeConfig::default();
        config.database.in_memory = true;
        config.dex.mode = DexMode::Simulated;
        config.settlement.delay_ms = 0;

        let service = Arc::new(node::build_service(&config).await?);
        let app = api::router(service, &config.server);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
        })
    }

    async fn get(&self, path: &str) -> Result<(u16, Value)> {
        let resp = self.http.get(format!("{}{}", self.base, path)).send().await?;
        Ok((resp.status().as_u16(), resp.json().await?))
    }

    async fn post(&self, path: &str, body: Value) -> Result<(u16, Value)> {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await?;
        Ok((resp.status().as_u16(), resp.json().await?))
    }

    async fn delete(&self, path: &str) -> Result<(u16, Value)> {
        let resp = self.http.delete(format!("{}{}", self.base, path)).send().await?;
        Ok((resp.status().as_u16(), resp.json().await?))
    }

    async fn create_pool(&self, members: &[&str]) -> Result<String> {
        let (status, pool) = self
            .post(
                "/api/pools",
                json!({
                    "name": "Desk",
                    "multisigAddress": "0xsafe",
                    "creatorAddress": members[0],
                    "members": members,
                    "requiredSignatures": 1
                }),
            )
            .await?;
        assert_eq!(status, 201);
        Ok(pool["id"].as_str().unwrap_or_default().to_string())
    }
}

// ============================================================================
// Health and pools
// ============================================================================

#[tokio::test]
async fn test_health() -> Result<()> {
    let node = TestNode::start().await?;
    let (status, body) = node.get("/health").await?;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_pool_round_trip() -> Result<()> {
    let node = TestNode::start().await?;
    let pool_id = node.create_pool(&["0xa", "0xb"]).await?;

    let (status, summary) = node.get(&format!("/api/pools/{pool_id}")).await?;
    assert_eq!(status, 200);
    assert_eq!(summary["memberCount"], 2);
    assert_eq!(summary["multisigAddress"], "0xsafe");

    let (status, pools) = node.get("/api/pools?userAddress=0xb").await?;
    assert_eq!(status, 200);
    assert_eq!(pools.as_array().map(Vec::len), Some(1));

    let (status, body) = node.get("/api/pools/missing").await?;
    assert_eq!(status, 404);
    assert_eq!(body["kind"], "NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn test_delete_by_non_creator_is_forbidden() -> Result<()> {
    let node = TestNode::start().await?;
    let pool_id = node.create_pool(&["0xa", "0xb"]).await?;

    let (status, body) = node
        .delete(&format!("/api/pools/{pool_id}?userAddress=0xb"))
        .await?;
    assert_eq!(status, 403);
    assert_eq!(body["kind"], "UNAUTHORIZED");

    let (status, _) = node
        .delete(&format!("/api/pools/{pool_id}?userAddress=0xa"))
        .await?;
    assert_eq!(status, 400);

    Ok(())
}

#[tokio::test]
async fn test_last_member_leaving_deletes_pool() -> Result<()> {
    let node = TestNode::start().await?;
    let pool_id = node.create_pool(&["0xa"]).await?;

    let (status, body) = node
        .delete(&format!("/api/pools/{pool_id}/members?userAddress=0xa"))
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["poolDeleted"], true);

    let (status, _) = node.get(&format!("/api/pools/{pool_id}")).await?;
    assert_eq!(status, 404);

    Ok(())
}

// ============================================================================
// Proposal flow
// ============================================================================

#[tokio::test]
async fn test_vote_and_execute_over_http() -> Result<()> {
    let node = TestNode::start().await?;
    let pool_id = node.create_pool(&["0xa", "0xb"]).await?;

    let (status, body) = node
        .post(
            &format!("/api/pools/{pool_id}/members"),
            json!({ "userAddress": "0xc" }),
        )
        .await?;
    assert_eq!(status, 201);
    assert_eq!(body["role"], "MEMBER");

    let (status, proposal) = node
        .post(
            &format!("/api/pools/{pool_id}/proposals"),
            json!({
                "proposerAddress": "0xa",
                "fromToken": "ETH",
                "toToken": "USDC",
                "amount": "0.5",
                "minReceived": "900"
            }),
        )
        .await?;
    assert_eq!(status, 201);
    let proposal_id = proposal["id"].as_str().unwrap_or_default().to_string();

    let (_, early) = node
        .post(
            &format!("/api/proposals/{proposal_id}/execute"),
            json!({ "executorAddress": "0xa" }),
        )
        .await?;
    assert_eq!(early["kind"], "INVALID_STATE");

    for voter in ["0xa", "0xb"] {
        let (status, _) = node
            .post(
                &format!("/api/proposals/{proposal_id}/vote"),
                json!({ "userAddress": voter, "vote": "FOR" }),
            )
            .await?;
        assert_eq!(status, 200);
    }

    let (status, proposals) = node.get(&format!("/api/pools/{pool_id}/proposals")).await?;
    assert_eq!(status, 200);
    assert_eq!(proposals[0]["status"], "APPROVED");
    assert_eq!(proposals[0]["votes"].as_array().map(Vec::len), Some(2));

    let (status, executed) = node
        .post(
            &format!("/api/proposals/{proposal_id}/execute"),
            json!({ "executorAddress": "0xb" }),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(executed["transaction"]["status"], "PENDING");
    assert_eq!(executed["txData"]["value"], "0.5");

    let (status, again) = node
        .post(
            &format!("/api/proposals/{proposal_id}/execute"),
            json!({ "executorAddress": "0xb" }),
        )
        .await?;
    assert_eq!(status, 400);
    assert_eq!(again["kind"], "CONFLICT");

    Ok(())
}

// ============================================================================
// Tokens and quotes
// ============================================================================

#[tokio::test]
async fn test_pool_tokens_and_ledger() -> Result<()> {
    let node = TestNode::start().await?;
    let pool_id = node.create_pool(&["0xa"]).await?;

    let (status, token) = node
        .post(
            &format!("/api/pools/{pool_id}/tokens"),
            json!({ "symbol": "USDT", "decimals": 6, "balance": "250" }),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(token["balance"], "250");

    let (_, tokens) = node.get(&format!("/api/pools/{pool_id}/tokens")).await?;
    assert_eq!(tokens.as_array().map(Vec::len), Some(1));

    let (_, ledger) = node.get(&format!("/api/pools/{pool_id}/transactions")).await?;
    assert_eq!(ledger[0]["type"], "POOL_CREATION");

    Ok(())
}

#[tokio::test]
async fn test_swap_catalog_and_quote() -> Result<()> {
    let node = TestNode::start().await?;

    let (status, tokens) = node.get("/api/swap/tokens").await?;
    assert_eq!(status, 200);
    assert_eq!(tokens.as_array().map(Vec::len), Some(5));

    let (status, quote) = node
        .post(
            "/api/swap/quote",
            json!({ "fromToken": "ETH", "toToken": "USDT", "amount": "2" }),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(quote["toAmount"], "1.9");
    assert_eq!(quote["fromToken"], "ETH");

    let (status, body) = node
        .post(
            "/api/swap/quote",
            json!({ "fromToken": "ETH", "toToken": "NOPE", "amount": "2" }),
        )
        .await?;
    assert_eq!(status, 502);
    assert_eq!(body["kind"], "EXTERNAL_UNAVAILABLE");

    Ok(())
}
