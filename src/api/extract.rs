//! Request extractors
//!
//! Wrappers over axum's `Json`, `Path` and `Query` whose rejections render as
//! [`ApiError`] bodies carrying the request id.

use super::{errors::ApiError, middleware::RequestId};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, Extensions},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

/// JSON request body
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

/// Typed path parameters
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

/// Typed query string
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

fn request_id(extensions: &Extensions) -> String {
    extensions
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default()
}

fn rejected(request_id: String, what: &str, message: String) -> ApiError {
    warn!(request_id = %request_id, "rejected {}: {}", what, message);
    ApiError::bad_request(request_id, message)
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id(req.extensions());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(request_id, "body", rejection.body_text())),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(
                request_id(&parts.extensions),
                "path",
                rejection.body_text(),
            )),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(
                request_id(&parts.extensions),
                "query",
                rejection.body_text(),
            )),
        }
    }
}
