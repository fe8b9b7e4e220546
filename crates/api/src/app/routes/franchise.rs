use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{delete, get, post},
    Json, Router,
};

use slicehouse_core::{FranchiseId, StoreId, UserId};
use slicehouse_franchises::{Franchise, NewFranchise, NewStore, Store};

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AuthUser, JsonBody};

/// `:id` is a user id for GET and a franchise id everywhere else.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_franchises).post(create_franchise))
        .route("/:id", get(user_franchises).delete(delete_franchise))
        .route("/:id/store", post(create_store))
        .route("/:id/store/:store_id", delete(delete_store))
}

pub async fn list_franchises(
    Extension(services): Extension<Arc<AppServices>>,
    viewer: Option<AuthUser>,
) -> Result<Json<Vec<Franchise>>, ApiError> {
    let viewer = viewer.as_ref().map(AuthUser::user);
    Ok(Json(services.franchises.list(viewer).await?))
}

pub async fn user_franchises(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Franchise>>, ApiError> {
    let user: UserId = id.parse()?;
    Ok(Json(services.franchises.user_franchises(&actor, user).await?))
}

pub async fn create_franchise(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    JsonBody(body): JsonBody<NewFranchise>,
) -> Result<Json<Franchise>, ApiError> {
    Ok(Json(services.franchises.create(&actor, body).await?))
}

pub async fn delete_franchise(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let franchise: FranchiseId = id.parse()?;
    services.franchises.delete(&actor, franchise).await?;
    Ok(Json(MessageResponse { message: "franchise deleted" }))
}

pub async fn create_store(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<NewStore>,
) -> Result<Json<Store>, ApiError> {
    let franchise: FranchiseId = id.parse()?;
    Ok(Json(services.franchises.create_store(&actor, franchise, body).await?))
}

pub async fn delete_store(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Path((id, store_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let franchise: FranchiseId = id.parse()?;
    let store: StoreId = store_id.parse()?;
    services.franchises.delete_store(&actor, franchise, store).await?;
    Ok(Json(MessageResponse { message: "store deleted" }))
}
