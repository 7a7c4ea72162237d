//! HTTP API
//!
//! JSON over HTTP, camelCase bodies. Failures render as
//! `{"error": message, "kind": kind}`; a failed execution adds the persisted
//! `transaction`.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use handlers::AppState;
pub use routes::router;
