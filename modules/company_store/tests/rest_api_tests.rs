mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{test_store, TestStore};

fn app(ts: &TestStore) -> Router {
    Router::new().nest("/api", ts.store.router())
}

async fn send(app: &Router, req: Request<Body>) -> Result<(StatusCode, Option<String>, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, content_type, body))
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> Result<String> {
    let (status, _, body) = send(
        app,
        post_json("/api/auth", None, json!({"username": username, "password": password})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    Ok(body["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("no token in {body}"))?
        .to_owned())
}

#[tokio::test]
async fn auth_issues_token_and_rejects_wrong_password() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);

    let token = login(&app, "alice", "pw").await?;
    assert_eq!(token.split('.').count(), 3);

    let (status, ctype, body) = send(
        &app,
        post_json("/api/auth", None, json!({"username": "alice", "password": "nope"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctype.as_deref(), Some("application/problem+json"));
    assert_eq!(body["code"], "STORE_UNAUTHORIZED");
    assert_eq!(body["status"], 401);
    assert_eq!(body["instance"], "/api/auth");
    Ok(())
}

#[tokio::test]
async fn auth_requires_both_fields() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);

    for payload in [
        json!({"username": "alice"}),
        json!({"password": "pw"}),
        json!({"username": "", "password": "pw"}),
        json!({}),
    ] {
        let (status, _, body) = send(&app, post_json("/api/auth", None, payload.clone())).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["code"], "STORE_VALIDATION");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_bad_request() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, ctype, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctype.as_deref(), Some("application/problem+json"));
    assert_eq!(body["code"], "STORE_BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);

    for req in [
        get("/api/info", None),
        get("/api/buy/cup", None),
        get("/api/info", Some("garbage")),
        post_json("/api/sendCoin", None, json!({"toUser": "bob", "amount": 1})),
    ] {
        let uri = req.uri().to_string();
        let (status, _, _) = send(&app, req).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let req = Request::builder()
        .uri("/api/info")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6cHc=")
        .body(Body::empty())?;
    let (status, _, _) = send(&app, req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn info_for_fresh_user() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);
    let token = login(&app, "alice", "pw").await?;

    let (status, _, body) = send(&app, get("/api/info", Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "coins": 1000,
            "inventory": [],
            "coinHistory": {"received": [], "sent": []}
        })
    );
    Ok(())
}

#[tokio::test]
async fn send_buy_and_info_flow() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);
    let alice = login(&app, "alice", "pw").await?;
    let bob = login(&app, "bob", "pw").await?;

    let (status, _, _) = send(
        &app,
        post_json("/api/sendCoin", Some(&alice), json!({"toUser": "bob", "amount": 300})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    for item in ["cup", "cup", "book"] {
        let (status, _, body) = send(&app, get(&format!("/api/buy/{item}"), Some(&alice))).await?;
        assert_eq!(status, StatusCode::OK, "{item}: {body}");
    }

    let (_, _, info) = send(&app, get("/api/info", Some(&alice))).await?;
    assert_eq!(info["coins"], 1000 - 300 - 20 - 20 - 50);
    assert_eq!(
        info["inventory"],
        json!([{"type": "book", "quantity": 1}, {"type": "cup", "quantity": 2}])
    );
    assert_eq!(info["coinHistory"]["sent"], json!([{"toUser": "bob", "amount": 300}]));
    assert_eq!(info["coinHistory"]["received"], json!([]));

    let (_, _, info) = send(&app, get("/api/info", Some(&bob))).await?;
    assert_eq!(info["coins"], 1300);
    assert_eq!(
        info["coinHistory"]["received"],
        json!([{"fromUser": "alice", "amount": 300}])
    );
    Ok(())
}

#[tokio::test]
async fn send_coin_failures_are_bad_requests() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);
    let alice = login(&app, "alice", "pw").await?;
    login(&app, "bob", "pw").await?;

    let cases = [
        (json!({"toUser": "alice", "amount": 10}), "STORE_INVALID_RECIPIENT"),
        (json!({"toUser": "ghost", "amount": 10}), "STORE_RECIPIENT_NOT_FOUND"),
        (json!({"toUser": "bob", "amount": 5000}), "STORE_INSUFFICIENT_FUNDS"),
        (json!({"toUser": "bob", "amount": 0}), "STORE_VALIDATION"),
        (json!({"amount": 10}), "STORE_VALIDATION"),
        (json!({"toUser": "bob", "amount": "ten"}), "STORE_BAD_REQUEST"),
    ];
    for (payload, code) in cases {
        let (status, ctype, body) =
            send(&app, post_json("/api/sendCoin", Some(&alice), payload.clone())).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(ctype.as_deref(), Some("application/problem+json"));
        assert_eq!(body["code"], code, "{payload}");
    }

    let (_, _, info) = send(&app, get("/api/info", Some(&alice))).await?;
    assert_eq!(info["coins"], 1000);
    Ok(())
}

#[tokio::test]
async fn buy_failures_are_bad_requests() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);
    let token = login(&app, "alice", "pw").await?;

    let (status, _, body) = send(&app, get("/api/buy/yacht", Some(&token))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "STORE_MERCH_NOT_FOUND");

    for uri in ["/api/buy", "/api/buy/"] {
        let (status, _, body) = send(&app, get(uri, Some(&token))).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "STORE_VALIDATION");
    }

    // 1000 coins buy exactly two pink hoodies
    let (status, _, _) = send(&app, get("/api/buy/pink-hoody", Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, get("/api/buy/pink-hoody", Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = send(&app, get("/api/buy/pink-hoody", Some(&token))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "STORE_INSUFFICIENT_FUNDS");
    Ok(())
}

#[tokio::test]
async fn problem_instance_keeps_the_api_prefix() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);
    let alice = login(&app, "alice", "pw").await?;
    login(&app, "bob", "pw").await?;

    let (status, _, body) = send(
        &app,
        post_json("/api/sendCoin", Some(&alice), json!({"toUser": "bob", "amount": 5000})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["instance"], "/api/sendCoin");

    let (_, _, body) = send(&app, get("/api/buy/yacht", Some(&alice))).await?;
    assert_eq!(body["instance"], "/api/buy/yacht");

    let (_, _, body) = send(&app, get("/api/info", None)).await?;
    assert_eq!(body["instance"], "/api/info");

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("[1, 2"))?;
    let (status, _, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "STORE_BAD_REQUEST");
    assert_eq!(body["instance"], "/api/auth");
    Ok(())
}

#[tokio::test]
async fn openapi_document_lists_store_paths() -> Result<()> {
    let ts = test_store().await?;
    let app = app(&ts);

    let (status, _, doc) = send(&app, get("/api/openapi.json", None)).await?;
    assert_eq!(status, StatusCode::OK);
    for path in ["/api/auth", "/api/sendCoin", "/api/buy/{item}", "/api/info"] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
    Ok(())
}
