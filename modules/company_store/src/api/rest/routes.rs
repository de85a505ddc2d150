use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::{handlers, openapi};
use crate::domain::service::Service;

/// Store routes relative to the API prefix.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route("/auth", post(handlers::authenticate))
        .route("/sendCoin", post(handlers::send_coin))
        .route("/buy", get(handlers::buy_without_item))
        .route("/buy/", get(handlers::buy_without_item))
        .route("/buy/{item}", get(handlers::buy))
        .route("/info", get(handlers::info))
        .route("/openapi.json", get(openapi::serve))
        .layer(Extension(service))
}
