//! HTTP 接口：health / ask（SSE）/ update

#![cfg(feature = "web")]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use ask_sql::agent::{create_agent_components, query_executor_from_config};
use ask_sql::config::AppConfig;
use ask_sql::core::{StreamSettings, TaskScheduler};
use ask_sql::database::BulkLoader;
use ask_sql::llm::MockLlmClient;
use ask_sql::server::{router, AppState};
use ask_sql::QueryService;

async fn app(dir: &TempDir) -> (Router, AppConfig) {
    let mut cfg = AppConfig::default();
    cfg.database.path = dir.path().join("hotel.db");
    query_executor_from_config(&cfg)
        .ensure_schema(&cfg.database.table)
        .await
        .unwrap();

    let components = Arc::new(create_agent_components(&cfg, Arc::new(MockLlmClient)));
    let settings = StreamSettings {
        thought_delay: Duration::from_millis(0),
        ..StreamSettings::default()
    };
    let state = Arc::new(AppState {
        service: QueryService::new(components, TaskScheduler::new(2), settings),
        loader: BulkLoader::new(cfg.database.path.clone()),
        default_table: cfg.database.table.clone(),
        keep_alive: Duration::from_secs(15),
    });
    (router(state), cfg)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// 解析 SSE 中的 data 帧
fn sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_and_index() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({"status": "ok"}));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["message"].as_str().unwrap().starts_with("Welcome"));
}

#[tokio::test]
async fn test_update_then_ask_over_sse() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir).await;

    let payload = json!({
        "data": [
            {"hotel": "City Hotel", "is_canceled": 0, "adr": 75.5},
            {"hotel": "Resort Hotel", "is_canceled": 1, "adr": 120.0}
        ],
        "table_name": "hotel_bookings"
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Successfully updated table hotel_bookings with 2 records");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ask")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"query": "SELECT COUNT(*) FROM hotel_bookings"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let events = sse_events(&body_string(response).await);
    let (last, thoughts) = events.split_last().unwrap();
    assert!(!thoughts.is_empty());
    assert!(thoughts.iter().all(|e| e["type"] == "thought"));
    assert_eq!(last["type"], "result");
    assert_eq!(last["content"], "I have counted the following information:\n• 2,\n");
}

#[tokio::test]
async fn test_ask_get_reports_sql_errors() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ask?query=SELECT%20*%20FROM%20missing_table")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = sse_events(&body_string(response).await);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "error");
    assert!(events[0]["content"].as_str().unwrap().contains("no such table"));
}

#[tokio::test]
async fn test_empty_query_and_bad_update_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/ask?query=%20").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"data": [{"a": 1}], "table_name": "bad name"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.starts_with("Failed to update database: "));
}
