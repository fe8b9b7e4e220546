//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, token codec and service wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response bodies not owned by a domain crate
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        sessions: services.sessions.clone(),
    };
    let metrics = services.metrics.clone();

    Router::new()
        .merge(routes::system_router())
        .nest("/api", routes::router())
        .fallback(routes::system::unknown_endpoint)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(metrics, middleware::track_requests))
                .layer(Extension(services))
                .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware)),
        )
}
