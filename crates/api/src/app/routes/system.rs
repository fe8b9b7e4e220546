use axum::{http::StatusCode, Json};

use crate::app::dto::WelcomeResponse;
use crate::app::errors::json_error;

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "welcome to slicehouse",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn unknown_endpoint() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "unknown endpoint")
}
