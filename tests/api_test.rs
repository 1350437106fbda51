//! End-to-end tests for the task API.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{client, TestApp};

async fn create(app: &TestApp, body: Value) -> reqwest::Response {
    client()
        .post(app.url("/api/tasks"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_task_crud_lifecycle() {
    let app = TestApp::spawn().await;
    let client = client();

    let res = create(&app, json!({ "title": "  Write report  ", "description": " draft " })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let task: Value = res.json().await.unwrap();
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["description"], "draft");
    assert_eq!(task["completed"], false);
    assert_eq!(task["createdAt"], task["updatedAt"]);
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let res = client
        .put(app.url(&format!("/api/tasks/{id}")))
        .json(&json!({ "title": "Write final report", "description": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "Write final report");
    assert_eq!(updated["description"], "");

    let res = client
        .patch(app.url(&format!("/api/tasks/{id}")))
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let patched: Value = res.json().await.unwrap();
    assert_eq!(patched["completed"], true);

    let res = client
        .delete(app.url(&format!("/api/tasks/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let deleted: Value = res.json().await.unwrap();
    assert_eq!(deleted["message"], "Task deleted successfully");
    assert_eq!(deleted["task"]["id"], id.as_str());

    let res = client
        .delete(app.url(&format!("/api/tasks/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Task not found" }));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = TestApp::spawn().await;

    for title in ["first", "second", "third"] {
        create(&app, json!({ "title": title })).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let tasks: Vec<Value> = client()
        .get(app.url("/api/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<_> = tasks.iter().map(|t| t["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_validation_messages() {
    let app = TestApp::spawn().await;

    let cases = [
        (json!({}), "Title is required"),
        (json!({ "title": "   " }), "Title is required"),
        (json!({ "title": 7 }), "Title is required"),
        (json!({ "title": "a".repeat(101) }), "Title must be 100 characters or less"),
        (
            json!({ "title": "ok", "description": "d".repeat(501) }),
            "Description must be 500 characters or less",
        ),
    ];

    for (payload, message) in cases {
        let res = create(&app, payload).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": message }));
    }

    let res = create(&app, json!({ "title": "a".repeat(100) })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_patch_rejects_non_boolean_and_unknown_ids() {
    let app = TestApp::spawn().await;
    let client = client();
    let task: Value = create(&app, json!({ "title": "toggle me" })).await.json().await.unwrap();
    let id = task["id"].as_str().unwrap();

    let res = client
        .patch(app.url(&format!("/api/tasks/{id}")))
        .json(&json!({ "completed": "yes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Completed status must be a boolean" }));

    let random = uuid::Uuid::new_v4().to_string();
    for unknown in ["not-a-uuid", random.as_str()] {
        let res = client
            .patch(app.url(&format!("/api/tasks/{unknown}")))
            .json(&json!({ "completed": "yes" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_malformed_json_and_unknown_route() {
    let app = TestApp::spawn().await;
    let client = client();

    let res = client
        .post(app.url("/api/tasks"))
        .header("content-type", "application/json")
        .body("{\"title\":")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid JSON payload" }));

    let res = client.get(app.url("/api/unknown")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Route not found" }));
}

#[tokio::test]
async fn test_health_reports_task_count() {
    let app = TestApp::spawn().await;
    create(&app, json!({ "title": "one" })).await;
    create(&app, json!({ "title": "two" })).await;

    let body: Value = client()
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tasksCount"], 2);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_system_overview_embeds_health() {
    let app = TestApp::spawn().await;
    create(&app, json!({ "title": "one" })).await;

    let res = client().get(app.url("/api/system/overview")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["service"], "taskflow-backend");
    assert_eq!(body["tasksCount"], 1);
    assert_eq!(body["upstreamHealth"]["status"], "healthy");
    assert_eq!(body["upstreamHealth"]["tasksCount"], 1);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = TestApp::spawn().await;

    let res = client()
        .get(app.url("/health"))
        .header("origin", "http://frontend.local")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
