pub mod github;
pub mod health;
pub mod stats;
pub mod todos;

use std::sync::Arc;

use axum::{http::StatusCode, Json, Router};
use ghtodo_service::{ServiceError, TodoAdapter};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

pub use github::GitHubProxy;

pub struct InnerAppState {
    pub adapter: TodoAdapter,
    pub proxy: GitHubProxy,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(todos::routes())
        .merge(stats::routes())
        .merge(github::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn to_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}
