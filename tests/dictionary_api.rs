//! 용어 사전 API 통합 테스트

mod common;

use axum::http::{Method, StatusCode};
use common::{create_project, expect_json, get, post_json, send};
use serde_json::{json, Value};

async fn entries(app: &axum::Router, project_id: &str) -> Vec<Value> {
    let dictionary = get(app, &format!("/api/projects/{project_id}/dictionary"), "alice").await;
    expect_json(dictionary, StatusCode::OK).await["entries"]
        .as_array()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn new_project_has_empty_dictionary() {
    let app = common::build_test_app();
    let project = create_project(&app, "alice", "Spec").await;
    let id = project["id"].as_str().unwrap();

    let dictionary = expect_json(get(&app, &format!("/api/projects/{id}/dictionary"), "alice").await, StatusCode::OK).await;
    assert_eq!(dictionary["projectId"], id);
    assert!(dictionary["entries"].as_array().unwrap().is_empty());
    assert!(dictionary["createdAt"].is_null());
}

#[tokio::test]
async fn entries_are_trimmed_and_blank_context_dropped() {
    let app = common::build_test_app();
    let project = create_project(&app, "alice", "Spec").await;
    let id = project["id"].as_str().unwrap();

    let entry = post_json(
        &app,
        &format!("/api/projects/{id}/dictionary/entries"),
        "alice",
        json!({ "source": "  cat ", "target": " chat", "context": "   " }),
    )
    .await;
    let entry = expect_json(entry, StatusCode::CREATED).await;
    assert_eq!(entry["source"], "cat");
    assert_eq!(entry["target"], "chat");
    assert!(entry["context"].is_null());

    let blank = post_json(
        &app,
        &format!("/api/projects/{id}/dictionary/entries"),
        "alice",
        json!({ "source": "", "target": "x" }),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entries_are_edited_and_removed_by_id() {
    let app = common::build_test_app();
    let project = create_project(&app, "alice", "Spec").await;
    let id = project["id"].as_str().unwrap();

    for (source, target) in [("cat", "chat"), ("dog", "chien")] {
        post_json(
            &app,
            &format!("/api/projects/{id}/dictionary/entries"),
            "alice",
            json!({ "source": source, "target": target }),
        )
        .await;
    }
    let before = entries(&app, id).await;
    let dog_id = before[1]["id"].as_str().unwrap();

    let updated = send(
        &app,
        Method::PUT,
        &format!("/api/projects/{id}/dictionary/entries/{dog_id}"),
        Some("alice"),
        Some(json!({ "source": "dog", "target": "chien", "context": "animal" })),
    )
    .await;
    let updated = expect_json(updated, StatusCode::OK).await;
    assert_eq!(updated["context"], "animal");

    let cat_id = before[0]["id"].as_str().unwrap();
    let removed = send(
        &app,
        Method::DELETE,
        &format!("/api/projects/{id}/dictionary/entries/{cat_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let after = entries(&app, id).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0]["source"], "dog");
}

#[tokio::test]
async fn positional_remove_shifts_remaining_entries() {
    let app = common::build_test_app();
    let project = create_project(&app, "alice", "Spec").await;
    let id = project["id"].as_str().unwrap();

    for (source, target) in [("cat", "chat"), ("dog", "chien")] {
        post_json(
            &app,
            &format!("/api/projects/{id}/dictionary/entries"),
            "alice",
            json!({ "source": source, "target": target }),
        )
        .await;
    }

    let removed = send(&app, Method::DELETE, &format!("/api/projects/{id}/dictionary/positions/0"), Some("alice"), None).await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let remaining = entries(&app, id).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["source"], "dog");

    let out_of_range = send(
        &app,
        Method::PUT,
        &format!("/api/projects/{id}/dictionary/positions/5"),
        Some("alice"),
        Some(json!({ "source": "x", "target": "y" })),
    )
    .await;
    let json = expect_json(out_of_range, StatusCode::NOT_FOUND).await;
    assert_eq!(json["message"], "Dictionary entry not found");
}

#[tokio::test]
async fn foreign_dictionary_is_not_found() {
    let app = common::build_test_app();
    let project = create_project(&app, "alice", "Spec").await;
    let id = project["id"].as_str().unwrap();

    let response = post_json(
        &app,
        &format!("/api/projects/{id}/dictionary/entries"),
        "bob",
        json!({ "source": "cat", "target": "chat" }),
    )
    .await;
    let json = expect_json(response, StatusCode::NOT_FOUND).await;
    assert_eq!(json["message"], "Project not found");
}

#[tokio::test]
async fn non_numeric_position_is_invalid_input() {
    let app = common::build_test_app();
    let project = create_project(&app, "alice", "Spec").await;
    let id = project["id"].as_str().unwrap();

    let response = send(&app, Method::DELETE, &format!("/api/projects/{id}/dictionary/positions/abc"), Some("alice"), None).await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "INVALID_INPUT");
    assert!(json["details"].is_null());

    let missing_target = post_json(
        &app,
        &format!("/api/projects/{id}/dictionary/entries"),
        "alice",
        json!({ "source": "cat" }),
    )
    .await;
    let json = expect_json(missing_target, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}
