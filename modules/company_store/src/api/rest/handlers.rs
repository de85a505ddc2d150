use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path},
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{AuthRequest, AuthResponse, InfoResponse, SendCoinRequest};
use crate::api::rest::error::{map_caller_error, map_domain_error};
use crate::api::rest::extract::{ApiJson, CurrentUser};
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Log in, creating the account on first use
#[utoipa::path(
    post,
    path = "/api/auth",
    tag = "store",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Bearer token", body = AuthResponse),
        (status = 400, description = "Missing username or password", body = Problem),
        (status = 401, description = "Wrong password", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    )
)]
pub async fn authenticate(
    Extension(svc): Extension<Arc<Service>>,
    OriginalUri(uri): OriginalUri,
    ApiJson(req): ApiJson<AuthRequest>,
) -> Result<Json<AuthResponse>, ProblemResponse> {
    info!("Authenticating user: {}", req.username);

    match svc.authenticate(&req.username, &req.password).await {
        Ok(token) => Ok(Json(AuthResponse { token })),
        Err(e) => {
            error!("Failed to authenticate {}: {}", req.username, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Send coins to another employee
#[utoipa::path(
    post,
    path = "/api/sendCoin",
    tag = "store",
    request_body = SendCoinRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Coins sent"),
        (status = 400, description = "Invalid recipient, amount or insufficient funds", body = Problem),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    )
)]
pub async fn send_coin(
    Extension(svc): Extension<Arc<Service>>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    ApiJson(req): ApiJson<SendCoinRequest>,
) -> Result<StatusCode, ProblemResponse> {
    info!(
        "User {} sending {} coins to {}",
        user.id, req.amount, req.to_user
    );

    match svc.send_coin(&user, &req.to_user, req.amount).await {
        Ok(tx) => {
            info!("Transfer {} completed", tx.id);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            error!("Failed to send coins from user {}: {}", user.id, e);
            Err(map_caller_error(&e, uri.path()))
        }
    }
}

/// Buy one unit of a merch item
#[utoipa::path(
    get,
    path = "/api/buy/{item}",
    tag = "store",
    params(("item" = String, Path, description = "Merch name")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Item bought"),
        (status = 400, description = "Unknown item or insufficient funds", body = Problem),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    )
)]
pub async fn buy(
    Extension(svc): Extension<Arc<Service>>,
    CurrentUser(user): CurrentUser,
    Path(item): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<StatusCode, ProblemResponse> {
    info!("User {} buying {}", user.id, item);

    match svc.buy(&user, &item).await {
        Ok(_) => Ok(StatusCode::OK),
        Err(e) => {
            error!("Failed to buy {} for user {}: {}", item, user.id, e);
            Err(map_caller_error(&e, uri.path()))
        }
    }
}

/// `/buy` with no item segment.
pub async fn buy_without_item(
    CurrentUser(_user): CurrentUser,
    OriginalUri(uri): OriginalUri,
) -> Result<StatusCode, ProblemResponse> {
    Err(map_domain_error(
        &DomainError::validation("item", "must not be empty"),
        uri.path(),
    ))
}

/// Balance, inventory and coin history of the caller
#[utoipa::path(
    get,
    path = "/api/info",
    tag = "store",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Wallet summary", body = InfoResponse),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    )
)]
pub async fn info(
    Extension(svc): Extension<Arc<Service>>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<InfoResponse>, ProblemResponse> {
    info!("Getting info for user {}", user.id);

    match svc.wallet(&user).await {
        Ok(wallet) => Ok(Json(InfoResponse::from(wallet))),
        Err(e) => {
            error!("Failed to build info for user {}: {}", user.id, e);
            Err(map_caller_error(&e, uri.path()))
        }
    }
}
