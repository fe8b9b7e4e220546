use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::Response,
};
use serde::de::DeserializeOwned;

use slicehouse_auth::User;

use crate::app::errors::json_error;

/// Authenticated caller for a request.
///
/// Inserted into request extensions by the auth middleware when a valid
/// bearer token was presented. Handlers that take `AuthUser` reject
/// anonymous requests with 401; handlers that take `Option<AuthUser>` serve
/// both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized"))
    }
}

/// JSON request body whose rejections (bad syntax, missing fields, wrong
/// content type) answer with the usual `{error, message}` body and 400.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> Response {
    tracing::debug!(status = rejection.status().as_u16(), error = %rejection.body_text(), "request body rejected");
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}
