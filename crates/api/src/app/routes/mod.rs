use axum::{routing::get, Router};

pub mod auth;
pub mod franchise;
pub mod order;
pub mod system;

/// Router for every `/api` endpoint. Authentication is resolved by the
/// surrounding middleware; each handler decides whether it needs a caller.
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/order", order::router())
        .nest("/franchise", franchise::router())
}

pub fn system_router() -> Router {
    Router::new()
        .route("/", get(system::welcome))
        .route("/health", get(system::health))
}
