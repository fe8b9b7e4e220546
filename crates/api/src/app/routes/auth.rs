use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};

use slicehouse_auth::{AuthSession, User, UserPatch};
use slicehouse_core::UserId;

use crate::app::dto::{LoginRequest, MessageResponse, RegisterRequest};
use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::context::{AuthUser, JsonBody};
use crate::middleware::extract_bearer;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register).put(login).delete(logout))
        .route("/:id", put(update_user).delete(delete_user))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    let result = services
        .sessions
        .register(&body.name, &body.email, &body.password)
        .await;
    services.metrics.record_auth(result.is_ok());
    Ok(Json(result?))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    let result = services.sessions.login(&body.email, &body.password).await;
    services.metrics.record_auth(result.is_ok());
    if result.is_ok() {
        services.metrics.record_login();
    }
    Ok(Json(result?))
}

/// Requires a bearer header; the token itself may already be dead.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let token = match extract_bearer(&headers) {
        Ok(token) => token,
        Err(status) => return errors::json_error(status, "unauthorized", "unauthorized"),
    };

    if let Err(e) = services.sessions.logout(token).await {
        return errors::auth_error_to_response(e);
    }
    services.metrics.record_logout();
    Json(MessageResponse { message: "logout successful" }).into_response()
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let target: UserId = id.parse()?;
    let user = services.sessions.update_user(&actor, target, patch).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target: UserId = id.parse()?;
    services.sessions.delete_user(&actor, target).await?;
    Ok(Json(MessageResponse { message: "user deleted" }))
}
