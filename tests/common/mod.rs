#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use transdoc_lib::auth::{issue_token, AuthConfig};
use transdoc_lib::config::{LogFormat, ServerConfig};
use transdoc_lib::db::{Database, DbState};
use transdoc_lib::handlers::build_router;
use transdoc_lib::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// 외부 호출은 기본적으로 닿지 않는 주소로 보낸다
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".into(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Text,
        auth: AuthConfig::new(TEST_SECRET),
        openrouter_base_url: "http://127.0.0.1:9".to_string(),
        perplexity_base_url: "http://127.0.0.1:9".to_string(),
    }
}

pub fn test_state(config: ServerConfig) -> AppState {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    AppState::new(DbState::new(db), config).unwrap()
}

pub fn build_test_app() -> Router {
    build_router(test_state(test_config())).unwrap()
}

pub fn token(user_id: &str) -> String {
    issue_token(user_id, &AuthConfig::new(TEST_SECRET)).unwrap()
}

pub async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("Authorization", format!("Bearer {}", token(user)));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(user), None).await
}

pub async fn post_json(app: &Router, uri: &str, user: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(user), Some(body)).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// 상태 코드 확인 후 본문 JSON
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

pub async fn create_project(app: &Router, user: &str, name: &str) -> Value {
    let response = post_json(
        app,
        "/api/projects",
        user,
        serde_json::json!({ "name": name, "sourceLanguage": "en", "targetLanguage": "fr" }),
    )
    .await;
    expect_json(response, StatusCode::CREATED).await
}
