use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use slicehouse_auth::SessionManager;
use slicehouse_observability::Metrics;

use crate::app::errors;
use crate::context::AuthUser;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: SessionManager,
}

/// Resolve the bearer token, when one is presented, to the current user.
///
/// An absent or invalid token leaves the request anonymous and routes that
/// need a caller reject via the [`AuthUser`] extractor. A store failure
/// while checking the token ends the request with a server error.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Ok(token) = extract_bearer(req.headers()) {
        match state.sessions.authenticate(token).await {
            Ok(user) => {
                req.extensions_mut().insert(AuthUser(user));
            }
            Err(e) if !e.is_client_error() => return errors::auth_error_to_response(e),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token not accepted");
            }
        }
    }

    next.run(req).await
}

/// Structured access log plus request counters.
pub async fn track_requests(
    State(metrics): State<Arc<Metrics>>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let has_auth = req.headers().contains_key(axum::http::header::AUTHORIZATION);
    let started = Instant::now();

    let response = next.run(req).await;

    let latency = started.elapsed();
    let status = response.status().as_u16();
    metrics.record_request(method.as_str(), latency);

    let latency_ms = latency.as_millis() as u64;
    if status >= 500 {
        tracing::error!(method = %method, path = %path, status, latency_ms, has_auth, "request completed");
    } else if status >= 400 {
        tracing::warn!(method = %method, path = %path, status, latency_ms, has_auth, "request completed");
    } else {
        tracing::info!(method = %method, path = %path, status, latency_ms, has_auth, "request completed");
    }

    response
}

pub(crate) fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
