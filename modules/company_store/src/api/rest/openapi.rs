use axum::response::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::rest::dto::{
    AuthRequest, AuthResponse, CoinHistoryDto, InfoResponse, InventoryItemDto, ReceivedCoinDto,
    SendCoinRequest, SentCoinDto,
};
use crate::api::rest::handlers;
use crate::api::rest::problem::Problem;

#[derive(OpenApi)]
#[openapi(
    info(title = "Company Store API", description = "Coins, transfers and merch for employees"),
    paths(handlers::authenticate, handlers::send_coin, handlers::buy, handlers::info),
    components(schemas(
        AuthRequest,
        AuthResponse,
        SendCoinRequest,
        InfoResponse,
        InventoryItemDto,
        CoinHistoryDto,
        ReceivedCoinDto,
        SentCoinDto,
        Problem
    )),
    modifiers(&BearerAuth),
    tags((name = "store", description = "Company store operations"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_all_operations() {
        let doc = ApiDoc::openapi();
        for path in ["/api/auth", "/api/sendCoin", "/api/buy/{item}", "/api/info"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer"));
    }
}
