//! Router assembly

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{self, AppState};
use crate::config::ServerConfig;

/// Build the HTTP router over a shared service
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/pools", get(handlers::list_pools).post(handlers::create_pool))
        .route(
            "/pools/:id",
            get(handlers::get_pool).delete(handlers::delete_pool),
        )
        .route(
            "/pools/:id/members",
            get(handlers::list_members)
                .post(handlers::join_pool)
                .delete(handlers::leave_pool),
        )
        .route(
            "/pools/:id/proposals",
            get(handlers::list_proposals).post(handlers::create_proposal),
        )
        .route(
            "/pools/:id/tokens",
            get(handlers::list_tokens).post(handlers::upsert_token),
        )
        .route("/pools/:id/transactions", get(handlers::list_transactions))
        .route("/proposals/:proposal_id/vote", post(handlers::cast_vote))
        .route(
            "/proposals/:proposal_id/execute",
            post(handlers::execute_proposal),
        )
        .route("/swap/tokens", get(handlers::available_tokens))
        .route("/swap/quote", post(handlers::quote));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(server.request_timeout()))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        warn!("No valid CORS origins configured, using restrictive policy");
        return CorsLayer::new().allow_methods(Any).allow_headers(Any);
    }
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}
