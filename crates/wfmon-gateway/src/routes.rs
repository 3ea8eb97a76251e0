//! HTTP surface: ingest, queries, health, the WebSocket upgrade and the
//! static dashboard.

use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use wfmon_core::{Event, EventDraft, MonitorState};

use crate::context::MonitorContext;
use crate::error::GatewayError;
use crate::ws::ws_handler;

pub fn router(ctx: Arc<MonitorContext>, dashboard_dir: Option<&Path>) -> Router {
    let app = Router::new()
        .route("/health", get(health))
        .route(
            "/api/events",
            get(list_events).post(create_event).delete(clear_events),
        )
        .route("/api/state", get(get_state))
        .route("/ws", get(ws_handler));

    let app = match dashboard_dir {
        // ServeDir refuses `..` segments, so nothing outside `dir` is reachable.
        Some(dir) => app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => app.route("/", get(service_info)),
    };

    app.layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

// ─── CORS ────────────────────────────────────────────────────────────

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            |origin: &HeaderValue, _: &Parts| origin.to_str().is_ok_and(is_local_origin),
        ))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// `http(s)://localhost[:port]` or `http(s)://127.0.0.1[:port]`.
fn is_local_origin(origin: &str) -> bool {
    let Some(rest) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    let host = match rest.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => rest,
    };
    matches!(host, "localhost" | "127.0.0.1")
}

// ─── Handlers ────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn service_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "wfmon" }))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

async fn list_events(
    State(ctx): State<Arc<MonitorContext>>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>, GatewayError> {
    let Query(query) = query.map_err(|e| GatewayError::InvalidBody(e.body_text()))?;
    Ok(Json(ctx.events(query.limit).await))
}

async fn create_event(
    State(ctx): State<Arc<MonitorContext>>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Json<Event>, GatewayError> {
    let Json(draft) = payload.map_err(|e| GatewayError::InvalidBody(e.body_text()))?;
    let event = ctx.ingest(draft).await?;
    Ok(Json(event))
}

async fn get_state(State(ctx): State<Arc<MonitorContext>>) -> Json<MonitorState> {
    Json(ctx.state().await)
}

async fn clear_events(State(ctx): State<Arc<MonitorContext>>) -> Json<serde_json::Value> {
    ctx.clear().await;
    Json(serde_json::json!({ "status": "ok", "message": "Events cleared" }))
}
