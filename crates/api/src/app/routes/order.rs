use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    routing::get,
    Json, Router,
};

use slicehouse_orders::{MenuItem, NewMenuItem, NewOrder, OrderPage, PlacedOrder};

use crate::app::dto::PageQuery;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AuthUser, JsonBody};

pub fn router() -> Router {
    Router::new()
        .route("/menu", get(menu).put(add_menu_item))
        .route("/", get(list_orders).post(create_order))
}

pub async fn menu(Extension(services): Extension<Arc<AppServices>>) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(services.orders.menu().await?))
}

pub async fn add_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    JsonBody(body): JsonBody<NewMenuItem>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(services.orders.add_menu_item(&actor, body).await?))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderPage>, ApiError> {
    let page = query.page.unwrap_or(1);
    Ok(Json(services.orders.orders(&actor, page).await?))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    AuthUser(actor): AuthUser,
    JsonBody(body): JsonBody<NewOrder>,
) -> Result<Json<PlacedOrder>, ApiError> {
    let items = body.items.len();
    let revenue: f64 = body.items.iter().map(|i| i.price).sum();
    let started = Instant::now();

    let result = services.orders.create_order(&actor, body).await;
    services
        .metrics
        .record_order(items, revenue, result.is_ok(), started.elapsed());

    Ok(Json(result?))
}
