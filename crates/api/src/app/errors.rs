use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use slicehouse_auth::AuthError;
use slicehouse_core::DomainError;
use slicehouse_franchises::FranchiseError;
use slicehouse_orders::OrderError;

/// Any service failure surfaced by a handler.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Franchise(FranchiseError),
    Order(OrderError),
    /// Malformed path or query parameter.
    Invalid(DomainError),
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        ApiError::Auth(value)
    }
}

impl From<FranchiseError> for ApiError {
    fn from(value: FranchiseError) -> Self {
        ApiError::Franchise(value)
    }
}

impl From<OrderError> for ApiError {
    fn from(value: OrderError) -> Self {
        ApiError::Order(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        ApiError::Invalid(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => auth_error_to_response(e),
            ApiError::Franchise(e) => franchise_error_to_response(e),
            ApiError::Order(e) => order_error_to_response(e),
            ApiError::Invalid(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.detail()),
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuthError::DuplicateIdentity => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        AuthError::UnknownCredentials => json_error(StatusCode::NOT_FOUND, "unknown_user", err.to_string()),
        AuthError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string()),
        AuthError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
        AuthError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        AuthError::StoreUnavailable(msg) => store_unavailable(msg),
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn franchise_error_to_response(err: FranchiseError) -> Response {
    match err {
        FranchiseError::Auth(e) => auth_error_to_response(e),
        FranchiseError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        FranchiseError::UnknownAdmin(_) => json_error(StatusCode::NOT_FOUND, "unknown_admin", err.to_string()),
        FranchiseError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        FranchiseError::Store(msg) => store_unavailable(msg),
    }
}

pub fn order_error_to_response(err: OrderError) -> Response {
    match err {
        OrderError::Auth(e) => auth_error_to_response(e),
        OrderError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        OrderError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        OrderError::Fulfillment { ref message, ref report_url } => {
            tracing::warn!(error = %message, report_url = ?report_url, "factory rejected order");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({
                    "error": "fulfillment_failed",
                    "message": err.to_string(),
                    "reportUrl": report_url,
                })),
            )
                .into_response()
        }
        OrderError::Store(msg) => store_unavailable(msg),
    }
}

fn store_unavailable(msg: String) -> Response {
    tracing::error!(error = %msg, "store unavailable");
    json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "service unavailable")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use slicehouse_auth::DenyReason;

    use super::*;

    #[test]
    fn auth_errors_map_to_distinct_statuses() {
        let cases = [
            (AuthError::Validation("name is required".into()), StatusCode::BAD_REQUEST),
            (AuthError::DuplicateIdentity, StatusCode::CONFLICT),
            (AuthError::UnknownCredentials, StatusCode::NOT_FOUND),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden(DenyReason::InsufficientRole), StatusCode::FORBIDDEN),
            (AuthError::StoreUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AuthError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(auth_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn wrapped_auth_errors_keep_their_status() {
        let err = FranchiseError::Auth(AuthError::Forbidden(DenyReason::InsufficientRole));
        assert_eq!(ApiError::from(err).into_response().status(), StatusCode::FORBIDDEN);

        let err = OrderError::Fulfillment {
            message: "oven on fire".into(),
            report_url: None,
        };
        assert_eq!(ApiError::from(err).into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
