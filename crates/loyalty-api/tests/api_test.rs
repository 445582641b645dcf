//! HTTP 接口测试
//!
//! 在进程内驱动完整路由（含认证中间件），存储使用内存实现

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use loyalty_api::{AppState, auth::JwtConfig, build_router};
use loyalty_core::MemoryLedgerStore;
use loyalty_shared::retry::RetryPolicy;
use serde_json::{Value, json};
use tower::ServiceExt;

const ACCRUAL_TOKEN: &str = "accrual-secret";

// ==================== 辅助函数 ====================

fn app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryLedgerStore::new()),
        RetryPolicy::default(),
        JwtConfig::default(),
    )
    .with_bcrypt_cost(4)
    .with_accrual_token(Some(ACCRUAL_TOKEN.to_string()));
    build_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn upload_request(number: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/user/orders")
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(number.to_string()))
        .unwrap()
}

fn accrual_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/internal/accrual")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-accrual-token", ACCRUAL_TOKEN)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn register(app: &Router, login: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/user/register",
            None,
            json!({"login": login, "password": "p@ssw0rd"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["token"].as_str().unwrap().to_string()
}

/// 上传订单并回报积分，为用户准备余额
async fn fund(app: &Router, token: &str, number: &str, accrual: i64) {
    let (status, _) = send(app, upload_request(number, token)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = send(
        app,
        accrual_request(json!({"order": number, "status": "PROCESSED", "accrual": accrual})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ==================== 注册与登录 ====================

#[tokio::test]
async fn test_register_returns_token_in_header_and_body() {
    let app = app();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user/register",
            None,
            json!({"login": "alice", "password": "secret"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(header::AUTHORIZATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(header.starts_with("Bearer "));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(format!("Bearer {}", body["data"]["token"].as_str().unwrap()), header);
}

#[tokio::test]
async fn test_register_duplicate_login() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/register",
            None,
            json!({"login": "alice", "password": "other"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "LOGIN_TAKEN");
}

#[tokio::test]
async fn test_register_empty_login() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/register",
            None,
            json!({"login": "", "password": "secret"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"login": "alice", "password": "p@ssw0rd"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"login": "alice", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/user/login",
            None,
            json!({"login": "nobody", "password": "p@ssw0rd"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();
    let request = Request::builder()
        .uri("/api/user/balance")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, get_request("/api/user/balance", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ==================== 订单 ====================

#[tokio::test]
async fn test_upload_order_outcomes() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = send(&app, upload_request("79927398713", &alice)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["status"], "NEW");

    let (status, _) = send(&app, upload_request("79927398713", &alice)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, upload_request("79927398713", &bob)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ORDER_CONFLICT");

    let (status, body) = send(&app, upload_request("79927398710", &alice)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_ORDER_NUMBER");

    let (status, _) = send(&app, upload_request("", &alice)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, upload_request("   ", &alice)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_surrounding_whitespace_is_invalid_order_number() {
    let app = app();
    let alice = register(&app, "alice").await;

    for raw in [" 79927398713\n", "79927398713 ", "\t79927398713"] {
        let (status, body) = send(&app, upload_request(raw, &alice)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{:?}", raw);
        assert_eq!(body["code"], "INVALID_ORDER_NUMBER");
    }

    // 未落库任何订单
    let (status, _) = send(&app, get_request("/api/user/orders", &alice)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    fund(&app, &alice, "79927398713", 100).await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/balance/withdraw",
            Some(&alice),
            json!({"order": " 2377225624\n", "sum": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_ORDER_NUMBER");

    let (_, body) = send(&app, get_request("/api/user/balance", &alice)).await;
    assert_eq!(body["data"]["current"], 100);
}

#[tokio::test]
async fn test_list_orders() {
    let app = app();
    let alice = register(&app, "alice").await;

    let (status, body) = send(&app, get_request("/api/user/orders", &alice)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    send(&app, upload_request("79927398713", &alice)).await;
    send(&app, upload_request("12345678903", &alice)).await;
    send(
        &app,
        accrual_request(json!({"order": "79927398713", "status": "PROCESSED", "accrual": 500})),
    )
    .await;

    let (status, body) = send(&app, get_request("/api/user/orders", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["number"], "12345678903");
    assert_eq!(items[0]["status"], "NEW");
    assert!(items[0].get("accrual").is_none());
    assert_eq!(items[1]["number"], "79927398713");
    assert_eq!(items[1]["status"], "PROCESSED");
    assert_eq!(items[1]["accrual"], 500);
    assert!(items[1]["uploaded_at"].is_string());
}

// ==================== 余额与提现 ====================

#[tokio::test]
async fn test_balance_and_withdraw() {
    let app = app();
    let alice = register(&app, "alice").await;
    fund(&app, &alice, "79927398713", 500).await;

    let (status, body) = send(&app, get_request("/api/user/balance", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"current": 500, "withdrawn": 0}));

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/balance/withdraw",
            Some(&alice),
            json!({"order": "2377225624", "sum": 300}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"], "2377225624");
    assert_eq!(body["data"]["sum"], 300);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/user/balance/withdraw",
            Some(&alice),
            json!({"order": "9278923470", "sum": 300}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");

    let (_, body) = send(&app, get_request("/api/user/balance", &alice)).await;
    assert_eq!(body["data"], json!({"current": 200, "withdrawn": 300}));

    let (status, body) = send(&app, get_request("/api/user/withdrawals", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["order"], "2377225624");
    assert!(items[0]["processed_at"].is_string());
}

#[tokio::test]
async fn test_withdraw_rejections() {
    let app = app();
    let alice = register(&app, "alice").await;
    fund(&app, &alice, "79927398713", 100).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/user/balance/withdraw",
            Some(&alice),
            json!({"order": "12a", "sum": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/user/balance/withdraw",
            Some(&alice),
            json!({"order": "2377225624", "sum": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get_request("/api/user/withdrawals", &alice)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ==================== 积分回报 ====================

#[tokio::test]
async fn test_accrual_requires_token() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/internal/accrual")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"order": "79927398713", "status": "PROCESSED", "accrual": 1}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accrual_report_outcomes() {
    let app = app();
    let alice = register(&app, "alice").await;
    send(&app, upload_request("79927398713", &alice)).await;

    let (status, body) = send(
        &app,
        accrual_request(json!({"order": "79927398713", "status": "REGISTERED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applied"], false);

    let (_, body) = send(
        &app,
        accrual_request(json!({"order": "79927398713", "status": "PROCESSED", "accrual": 42})),
    )
    .await;
    assert_eq!(body["data"]["applied"], true);
    assert_eq!(body["data"]["credited"], 42);

    let (status, body) = send(
        &app,
        accrual_request(json!({"order": "79927398713", "status": "PROCESSED", "accrual": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applied"], false);

    let (_, body) = send(&app, get_request("/api/user/balance", &alice)).await;
    assert_eq!(body["data"]["current"], 42);

    let (status, _) = send(
        &app,
        accrual_request(json!({"order": "12345678903", "status": "PROCESSED", "accrual": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        accrual_request(json!({"order": "79927398713", "status": "UNKNOWN"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_accrual_pending_orders() {
    let app = app();
    let alice = register(&app, "alice").await;
    send(&app, upload_request("79927398713", &alice)).await;
    send(&app, upload_request("12345678903", &alice)).await;
    send(
        &app,
        accrual_request(json!({"order": "79927398713", "status": "INVALID"})),
    )
    .await;

    let request = Request::builder()
        .uri("/api/internal/accrual/pending?limit=10")
        .header("x-accrual-token", ACCRUAL_TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["number"], "12345678903");
}

#[tokio::test]
async fn test_health_without_database() {
    let app = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "skipped");
}
