//! Mapping of governance errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lib_pool_governance::{ErrorKind, PoolError};
use serde_json::{json, Value};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub PoolError);

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        Self(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::Conflict | ErrorKind::InvalidInput => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::ExternalUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let mut body = json!({
            "error": self.0.to_string(),
            "kind": kind.as_str(),
        });
        if let Some(transaction) = self.0.failed_transaction() {
            body["transaction"] = serde_json::to_value(transaction).unwrap_or(Value::Null);
        }
        (status_for(kind), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_pool_types::{Transaction, TransactionStatus, TransactionType};

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidState), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::ExternalUnavailable), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn not_found_body_names_kind() {
        let response = ApiError(PoolError::NotFound("Pool p1".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body["error"], "Pool p1 not found");
        assert_eq!(body["kind"], "NOT_FOUND");
        assert!(body.get("transaction").is_none());
    }

    #[tokio::test]
    async fn failed_swap_carries_transaction() {
        let transaction = Transaction {
            id: "tx-1".into(),
            pool_id: "pool".into(),
            proposal_id: Some("prop".into()),
            tx_type: TransactionType::Swap,
            status: TransactionStatus::Failed,
            from_token: Some("ETH".into()),
            to_token: Some("USDT".into()),
            amount: Some("1".into()),
            tx_hash: None,
            gas_used: None,
            gas_price: None,
            error_message: Some("no route".into()),
            created_at: chrono::Utc::now(),
            executed_at: None,
        };
        let err = PoolError::SwapFailed {
            transaction: Box::new(transaction),
            reason: "no route".into(),
        };

        let response = ApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_of(response).await;
        assert_eq!(body["kind"], "EXTERNAL_UNAVAILABLE");
        assert_eq!(body["transaction"]["id"], "tx-1");
        assert_eq!(body["transaction"]["status"], "FAILED");
    }
}
