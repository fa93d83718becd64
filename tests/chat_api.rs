//! AI 채팅 스트리밍 통합 테스트
//!
//! 로컬 axum 서버가 모델 제공자(SSE)와 검색 제공자 역할을 대신한다.

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use common::{body_bytes, post_json, send, test_config, test_state};
use serde_json::{json, Value};

use transdoc_lib::ai::search::PerplexityClient;
use transdoc_lib::handlers::build_router;

#[derive(Clone, Default)]
struct Mock {
    chunks: Arc<Vec<String>>,
    fail: bool,
    last_request: Arc<Mutex<Option<Value>>>,
}

async fn completions(State(mock): State<Mock>, Json(body): Json<Value>) -> impl IntoResponse {
    *mock.last_request.lock().unwrap() = Some(body);
    if mock.fail {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let mut sse = String::new();
    for chunk in mock.chunks.iter() {
        sse.push_str(&format!("data: {chunk}\n\n"));
    }
    sse.push_str("data: [DONE]\n\n");
    ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
}

async fn perplexity(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["model"], "llama-3.1-sonar-small-128k-online");
    assert_eq!(body["return_citations"], true);
    Json(json!({
        "choices": [{ "message": { "content": "Cats are called chats in French." } }],
        "citations": ["https://example.org/cats"]
    }))
}

/// 모의 제공자를 띄우고 base URL을 돌려준다
async fn spawn_provider(mock: Mock) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .route("/perplexity/chat/completions", post(perplexity))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn set_keys() {
    std::env::set_var("OPENROUTER_API_KEY", "test-openrouter-key");
    std::env::set_var("PERPLEXITY_API_KEY", "test-perplexity-key");
}

async fn chat_app(mock: Mock) -> Router {
    set_keys();
    let base = spawn_provider(mock).await;
    let mut config = test_config();
    config.openrouter_base_url = format!("{base}/v1");
    config.perplexity_base_url = format!("{base}/perplexity");
    build_router(test_state(config)).unwrap()
}

/// `code:json` 줄을 (code, json)으로 분해
fn parts(body: &[u8]) -> Vec<(String, Value)> {
    std::str::from_utf8(body)
        .unwrap()
        .lines()
        .map(|line| {
            let (code, payload) = line.split_once(':').unwrap();
            (code.to_string(), serde_json::from_str(payload).unwrap())
        })
        .collect()
}

fn chunk(delta: Value, finish_reason: Option<&str>) -> String {
    json!({ "choices": [{ "delta": delta, "finish_reason": finish_reason }] }).to_string()
}

#[tokio::test]
async fn text_reply_is_streamed_in_data_stream_format() {
    let mock = Mock {
        chunks: Arc::new(vec![
            chunk(json!({ "role": "assistant", "content": "" }), None),
            chunk(json!({ "content": "Bon" }), None),
            chunk(json!({ "content": "jour" }), None),
            chunk(json!({}), Some("stop")),
            json!({ "choices": [], "usage": { "prompt_tokens": 42, "completion_tokens": 2 } }).to_string(),
        ]),
        ..Default::default()
    };
    let app = chat_app(mock.clone()).await;

    let response = post_json(
        &app,
        "/api/chat",
        "alice",
        json!({
            "messages": [{ "role": "user", "content": "Translate hello" }],
            "context": { "project": { "name": "Spec", "sourceLanguage": "en", "targetLanguage": "fr" } },
            "model": "not/a-real-model"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-vercel-ai-data-stream"], "v1");

    let parts = parts(&body_bytes(response).await);
    let codes: Vec<&str> = parts.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(codes, vec!["f", "0", "0", "e", "d"]);
    assert!(parts[0].1["messageId"].as_str().unwrap().starts_with("msg-"));
    assert_eq!(parts[1].1, "Bon");
    assert_eq!(parts[2].1, "jour");
    assert_eq!(parts[3].1["finishReason"], "stop");
    assert_eq!(parts[3].1["isContinued"], false);
    assert_eq!(parts[4].1["usage"]["promptTokens"], 42);

    let upstream = mock.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(upstream["model"], "openai/gpt-4o-2024-11-20");
    assert_eq!(upstream["stream"], true);
    assert_eq!(upstream["temperature"].as_f64().map(|t| (t * 10.0).round()), Some(7.0));
    assert_eq!(upstream["tools"].as_array().unwrap().len(), 4);
    let system = upstream["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("Project Info:\nName: Spec\nLanguages: en → fr"));
    assert_eq!(upstream["messages"][1]["content"], "Translate hello");
}

#[tokio::test]
async fn tool_calls_are_executed_after_the_model_turn() {
    let mock = Mock {
        chunks: Arc::new(vec![
            chunk(
                json!({ "tool_calls": [{ "index": 0, "id": "call_search", "type": "function",
                    "function": { "name": "searchWeb", "arguments": "{\"query\":" } }] }),
                None,
            ),
            chunk(
                json!({ "tool_calls": [{ "index": 0, "function": { "arguments": "\"cat in french\"}" } }] }),
                None,
            ),
            chunk(
                json!({ "tool_calls": [{ "index": 1, "id": "call_dict", "type": "function",
                    "function": { "name": "addDictionaryEntry", "arguments": "{\"source\":\"cat\",\"target\":\"chat\"}" } }] }),
                None,
            ),
            chunk(json!({}), Some("tool_calls")),
        ]),
        ..Default::default()
    };
    let app = chat_app(mock).await;

    let response = post_json(
        &app,
        "/api/chat",
        "alice",
        json!({ "messages": [{ "role": "user", "content": "Look up cat" }] }),
    )
    .await;
    let parts = parts(&body_bytes(response).await);
    let codes: Vec<&str> = parts.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(codes, vec!["f", "9", "9", "a", "a", "e", "d"]);

    assert_eq!(parts[1].1["toolName"], "searchWeb");
    assert_eq!(parts[1].1["args"]["query"], "cat in french");

    let search_result = &parts[3].1;
    assert_eq!(search_result["toolCallId"], "call_search");
    assert_eq!(search_result["result"]["success"], true);
    assert_eq!(search_result["result"]["result"], "Cats are called chats in French.");
    assert_eq!(search_result["result"]["citations"][0], "https://example.org/cats");

    let dict_result = &parts[4].1;
    assert_eq!(dict_result["result"]["message"], "Added dictionary entry: cat → chat");

    assert_eq!(parts[5].1["finishReason"], "tool-calls");
}

#[tokio::test]
async fn search_models_are_sent_without_tools() {
    let mock = Mock {
        chunks: Arc::new(vec![chunk(json!({ "content": "ok" }), Some("stop"))]),
        ..Default::default()
    };
    let app = chat_app(mock.clone()).await;

    let response = post_json(
        &app,
        "/api/chat",
        "alice",
        json!({ "messages": [{ "role": "user", "content": "hi" }], "model": "perplexity/sonar" }),
    )
    .await;
    body_bytes(response).await;

    let upstream = mock.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(upstream["model"], "perplexity/sonar");
    assert!(upstream.get("tools").is_none());
}

#[tokio::test]
async fn provider_failure_becomes_error_part() {
    let mock = Mock {
        fail: true,
        ..Default::default()
    };
    let app = chat_app(mock).await;

    let response = post_json(
        &app,
        "/api/chat",
        "alice",
        json!({ "messages": [{ "role": "user", "content": "hi" }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let parts = parts(&body_bytes(response).await);
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[1].0, "3");
    assert!(parts[1].1.as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn chat_requires_auth_and_messages() {
    let app = chat_app(Mock::default()).await;

    let anonymous = send(
        &app,
        axum::http::Method::POST,
        "/api/chat",
        None,
        Some(json!({ "messages": [{ "role": "user", "content": "hi" }] })),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let empty = post_json(&app, "/api/chat", "alice", json!({ "messages": [] })).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn model_catalog_lists_default() {
    let app = chat_app(Mock::default()).await;
    let response = common::get(&app, "/api/models", "alice").await;
    let json = common::expect_json(response, StatusCode::OK).await;

    assert_eq!(json["defaultModel"], "openai/gpt-4o-2024-11-20");
    assert_eq!(json["models"].as_array().unwrap().len(), 26);
    assert_eq!(json["toolModels"].as_array().unwrap().len(), 24);
    assert_eq!(json["searchModels"], json!(["perplexity/sonar-reasoning", "perplexity/sonar"]));
}

#[tokio::test]
async fn web_search_provider_error_is_reported_in_result() {
    set_keys();
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = PerplexityClient::new(reqwest::Client::new(), format!("http://{addr}"));
    let result = client.search("cat", Some("academic")).await;

    assert_eq!(result, json!({ "success": false, "error": "Perplexity API error: 500" }));
}
