//! Integration tests for the HTTP API
//!
//! Tests lesson sessions over the router without binding a socket

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use signcoach::core::script::{self, ScriptItem};
use signcoach::core::{create_router, AppState, ClipClassifier, ScriptedClassifier};
use signcoach::types::{Candidate, ClipPrediction, LessonInput};

fn create_test_router() -> Router {
    create_router(Arc::new(AppState::new(None)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn new_lesson(app: &Router, body: Value) -> String {
    let (status, json) = send(app, "POST", "/lesson/new", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    json["session_id"].as_str().unwrap().to_string()
}

fn event_names(json: &Value) -> Vec<String> {
    json["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|e| e["event"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["lessons_active"], 0);
}

#[tokio::test]
async fn test_create_builtin_lesson() {
    let app = create_test_router();
    let (status, json) = send(
        &app,
        "POST",
        "/lesson/new",
        Some(json!({"lesson_id": "module1-final-test"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["session_id"].as_str().unwrap().starts_with("lesson_"));
    assert!(json["websocket_url"].as_str().unwrap().starts_with("/ws/"));
    assert_eq!(json["lesson_id"], "module1-final-test");
    assert_eq!(event_names(&json), vec!["target_started"]);
}

#[tokio::test]
async fn test_spell_word_over_http() {
    let app = create_test_router();
    let id = new_lesson(
        &app,
        json!({"plan": {"id": "word-ten", "kind": "fingerspell_practice", "targets": ["TEN"]}}),
    )
    .await;

    let script = script::parse("T(600ms) _(300ms) E(600ms) _(300ms) N(600ms)").unwrap();
    let mut names = Vec::new();
    for item in script.items {
        let (uri, body) = match item {
            ScriptItem::Input(LessonInput::Recognition(event)) => {
                (format!("/lesson/{}/event", id), serde_json::to_value(&event).unwrap())
            }
            ScriptItem::Input(LessonInput::Tick { now_ms }) => {
                (format!("/lesson/{}/tick", id), json!({ "now_ms": now_ms }))
            }
            other => panic!("unexpected item {:?}", other),
        };
        let (status, json) = send(&app, "POST", &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        names.extend(event_names(&json));
    }
    assert_eq!(
        names.iter().filter(|n| *n == "hold_confirmed").count(),
        3
    );
    assert_eq!(
        names.iter().filter(|n| *n == "lesson_completed").count(),
        1
    );

    let (status, json) = send(&app, "GET", &format!("/lesson/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"]["completed"], true);
    assert_eq!(json["outcome"]["passed"], true);
    assert_eq!(json["outcome"]["xp"], 50);

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["total_xp"], 50);
    assert_eq!(health["lessons_active"], 0);
}

#[tokio::test]
async fn test_error_codes() {
    let app = create_test_router();

    let (status, _) = send(&app, "GET", "/lesson/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/lesson/new",
        Some(json!({"lesson_id": "module9-missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/lesson/new", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/lesson/new",
        Some(json!({"plan": {"id": "empty", "kind": "gym", "targets": []}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Reading lessons have no clips
    let id = new_lesson(&app, json!({"lesson_id": "module2-intro"})).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/lesson/{}/clip/start", id),
        Some(json!({"now_ms": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Clip lessons refuse a stop without a recording
    let id = new_lesson(&app, json!({"lesson_id": "module3-final-test"})).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/lesson/{}/clip/stop", id),
        Some(json!({"now_ms": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_generic_input_endpoint() {
    let app = create_test_router();
    let id = new_lesson(&app, json!({"lesson_id": "module3-intro"})).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/lesson/{}/input", id),
        Some(json!({"input": "acknowledge", "now_ms": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event_names(&json), vec!["lesson_completed"]);
    assert_eq!(json["status"]["completed"], true);
}

#[tokio::test]
async fn test_clip_lesson_with_classifier() {
    let scripted = Arc::new(ScriptedClassifier::new());
    scripted.push(Ok(ClipPrediction::ranked(
        vec![Candidate::new("book", 0.9)],
        12,
    )));
    let classifier: Arc<dyn ClipClassifier> = scripted.clone();
    let app = create_router(Arc::new(AppState::new(Some(classifier))));

    let id = new_lesson(
        &app,
        json!({"plan": {
            "id": "clip-book",
            "kind": "dynamic_final",
            "targets": ["book"],
            "config": {"mastery": {"required_reps": 1}}
        }}),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/lesson/{}/clip/start", id),
        Some(json!({"now_ms": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event_names(&json), vec!["clip_started"]);

    for i in 0..12u64 {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/lesson/{}/clip/frame", id),
            Some(json!({"now_ms": i * 84, "frame": format!("frame-{}", i)})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send(
        &app,
        "POST",
        &format!("/lesson/{}/clip/stop", id),
        Some(json!({"now_ms": 1008})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names = event_names(&json);
    assert_eq!(names[0], "clip_stopped");
    assert!(names.contains(&"clip_accepted".to_string()));
    assert!(names.contains(&"all_mastered".to_string()));
    assert!(names.contains(&"lesson_completed".to_string()));
    assert!(json["pending_clip"].is_null());

    let (_, json) = send(&app, "GET", &format!("/lesson/{}", id), None).await;
    assert_eq!(json["outcome"]["passed"], true);
}
