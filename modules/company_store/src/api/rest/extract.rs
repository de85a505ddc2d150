use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, OriginalUri, Request},
    http::{header::AUTHORIZATION, request::Parts, Extensions, HeaderMap, StatusCode, Uri},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::rest::error::{from_parts, json_rejection, map_domain_error, unauthorized};
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::User;
use crate::domain::service::Service;

/// Path as the client sent it. Nested routers see `uri` with their prefix
/// stripped; `OriginalUri` keeps it.
pub fn request_path(extensions: &Extensions, uri: &Uri) -> String {
    extensions
        .get::<OriginalUri>()
        .map_or(uri.path(), |original| original.0.path())
        .to_owned()
}

/// JSON body extractor whose rejections render as Problem Details.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let instance = request_path(req.extensions(), req.uri());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection, &instance)),
        }
    }
}

/// The user behind the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let instance = request_path(&parts.extensions, &parts.uri);

        let svc = parts.extensions.get::<Arc<Service>>().cloned().ok_or_else(|| {
            tracing::error!("company_store service missing from request extensions");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "Service unavailable",
                &instance,
            )
        })?;

        let token = bearer_token(&parts.headers).ok_or_else(|| {
            debug!("missing or malformed Authorization header");
            unauthorized("Missing or malformed bearer token", &instance)
        })?;

        svc.resolve(token)
            .await
            .map(CurrentUser)
            .map_err(|e| map_domain_error(&e, &instance))
    }
}

/// Token part of `Authorization: Bearer <token>`; the scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
