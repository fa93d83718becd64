//! 변경 피드 (SSE) 통합 테스트

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{create_project, get};
use http_body_util::BodyExt;
use serde_json::Value;

#[tokio::test]
async fn feed_delivers_only_the_callers_changes() {
    let app = common::build_test_app();

    let response = get(&app, "/api/events", "alice").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    let mut body = response.into_body();

    create_project(&app, "bob", "Not yours").await;
    let mine = create_project(&app, "alice", "Yours").await;

    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no event within timeout")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();

    assert!(text.starts_with("event: project_created\n"));
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let event: Value = serde_json::from_str(data).unwrap();
    assert_eq!(event["ownerId"], "alice");
    assert_eq!(event["projectId"], mine["id"]);
    assert_eq!(event["kind"], "project_created");
}
