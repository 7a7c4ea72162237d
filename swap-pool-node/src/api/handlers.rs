//! Request handlers
//!
//! Thin adapters from HTTP to [`SwapPoolService`]; every rule lives in the
//! governance crate.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use lib_dex::{Quote, TokenInfo, TxDescriptor};
use lib_pool_governance::{
    CreatePoolRequest, CreateProposalRequest, MemberRemoval, QuoteSwapRequest, SwapPoolService,
    UpsertTokenRequest, VoteReceipt,
};
use lib_pool_types::{
    Pool, PoolMember, PoolSummary, PoolToken, ProposalDetails, SwapProposal, Transaction,
    VoteChoice,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiResult;

pub type AppState = Arc<SwapPoolService>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPoolBody {
    pub user_address: String,
    #[serde(default)]
    pub join_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    pub user_address: String,
    pub vote: VoteChoice,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteBody {
    pub executor_address: String,
}

/// Body returned after a successful execution
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub transaction: Transaction,
    pub tx_data: TxDescriptor,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---- Pools ----

pub async fn list_pools(
    State(svc): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<PoolSummary>>> {
    Ok(Json(svc.list_pools_for_user(&query.user_address).await?))
}

pub async fn create_pool(
    State(svc): State<AppState>,
    Json(body): Json<CreatePoolRequest>,
) -> ApiResult<(StatusCode, Json<Pool>)> {
    let pool = svc.create_pool(body).await?;
    Ok((StatusCode::CREATED, Json(pool)))
}

pub async fn get_pool(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
) -> ApiResult<Json<PoolSummary>> {
    Ok(Json(svc.get_pool(&pool_id).await?))
}

pub async fn delete_pool(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Value>> {
    svc.delete_pool(&pool_id, &query.user_address).await?;
    Ok(Json(json!({ "poolId": pool_id, "deleted": true })))
}

// ---- Members ----

pub async fn list_members(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
) -> ApiResult<Json<Vec<PoolMember>>> {
    Ok(Json(svc.list_active_members(&pool_id).await?))
}

pub async fn join_pool(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
    Json(body): Json<JoinPoolBody>,
) -> ApiResult<(StatusCode, Json<PoolMember>)> {
    let member = svc
        .add_member(&pool_id, &body.user_address, body.join_code.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn leave_pool(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<MemberRemoval>> {
    Ok(Json(svc.remove_member(&pool_id, &query.user_address).await?))
}

// ---- Proposals ----

pub async fn list_proposals(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
) -> ApiResult<Json<Vec<ProposalDetails>>> {
    Ok(Json(svc.list_proposals(&pool_id).await?))
}

pub async fn create_proposal(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
    Json(body): Json<CreateProposalRequest>,
) -> ApiResult<(StatusCode, Json<SwapProposal>)> {
    let proposal = svc.create_proposal(&pool_id, body).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

pub async fn cast_vote(
    State(svc): State<AppState>,
    Path(proposal_id): Path<String>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<VoteReceipt>> {
    Ok(Json(
        svc.cast_vote(&proposal_id, &body.user_address, body.vote).await?,
    ))
}

pub async fn execute_proposal(
    State(svc): State<AppState>,
    Path(proposal_id): Path<String>,
    Json(body): Json<ExecuteBody>,
) -> ApiResult<Json<ExecutionResponse>> {
    let receipt = svc
        .execute_proposal(&proposal_id, &body.executor_address)
        .await?;
    Ok(Json(ExecutionResponse {
        transaction: receipt.transaction,
        tx_data: receipt.descriptor,
    }))
}

// ---- Tokens and ledger ----

pub async fn list_tokens(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
) -> ApiResult<Json<Vec<PoolToken>>> {
    Ok(Json(svc.list_pool_tokens(&pool_id).await?))
}

pub async fn upsert_token(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
    Json(body): Json<UpsertTokenRequest>,
) -> ApiResult<Json<PoolToken>> {
    Ok(Json(svc.upsert_pool_token(&pool_id, body).await?))
}

pub async fn list_transactions(
    State(svc): State<AppState>,
    Path(pool_id): Path<String>,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(svc.list_pool_transactions(&pool_id).await?))
}

// ---- Swap catalog ----

pub async fn available_tokens(State(svc): State<AppState>) -> ApiResult<Json<Vec<TokenInfo>>> {
    Ok(Json(svc.list_available_tokens().await?))
}

pub async fn quote(
    State(svc): State<AppState>,
    Json(body): Json<QuoteSwapRequest>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(svc.quote_swap(body).await?))
}
