//! HTTP 接口
//!
//! - GET  /        欢迎信息
//! - GET  /health  健康检查
//! - GET  /ask?query=...、POST /ask {"query": ...}  以 SSE 推送 thought / result / error
//! - POST /update  批量写入 {"data": [...], "table_name": "..."}

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::core::QueryService;
use crate::database::BulkLoader;

/// 共享状态
pub struct AppState {
    pub service: QueryService,
    pub loader: BulkLoader,
    pub default_table: String,
    pub keep_alive: Duration,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub table_name: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ask", get(ask_get).post(ask_post))
        .route("/update", axum::routing::post(update))
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Hotel Booking Management System" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;
type SseResponse = Sse<SseStream>;

fn event_stream(state: &AppState, query: String) -> Result<SseResponse, (StatusCode, String)> {
    let query = query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query is required".to_string()));
    }
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(%request_id, query = %query, "processing streaming query");

    let events: SseStream = Box::pin(state.service.execute_query(query).map(|ev| {
        let frame = Event::default()
            .json_data(&ev)
            .unwrap_or_else(|_| Event::default().data(ev.to_json()));
        Ok(frame)
    }));
    Ok(Sse::new(events)
        .keep_alive(KeepAlive::new().interval(state.keep_alive).text("keepalive")))
}

/// GET /ask：便于浏览器 EventSource 调用
async fn ask_get(
    State(state): State<Arc<AppState>>,
    Query(req): Query<AskRequest>,
) -> Result<SseResponse, (StatusCode, String)> {
    event_stream(&state, req.query)
}

async fn ask_post(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<SseResponse, (StatusCode, String)> {
    event_stream(&state, req.query)
}

async fn update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let table = req
        .table_name
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| state.default_table.clone());
    tracing::info!(table = %table, rows = req.data.len(), "updating table");

    match state.loader.write_rows(&table, req.data).await {
        Ok(count) => Ok(Json(json!({
            "status": "success",
            "message": format!("Successfully updated table {} with {} records", table, count),
        }))),
        Err(e) => {
            tracing::error!(error = %e, "error updating database");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to update database: {}", e),
            ))
        }
    }
}
