//! HTTP front-end — fixed routes for direct callers.
//!
//! Four POST routes mirror the four operations; required-field checks are
//! hardcoded per route (the operation registry is an MCP-side concern; the
//! asymmetry is intentional). Bodies are parsed leniently: malformed or
//! absent JSON is treated as an empty object, so missing-field validation
//! produces the 400 response rather than a framework-level rejection.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::client::{FalClient, Outcome};

/// Fixed service name reported by `/health`.
const SERVICE_NAME: &str = "fal-gateway-http";

/// Build the HTTP router over a shared vendor client.
pub fn router(client: Arc<FalClient>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/edit/flux", post(edit_flux))
        .route("/edit/qwen", post(edit_qwen))
        .route("/remove-bg", post(remove_bg))
        .route("/upscale", post(upscale))
        .with_state(client)
}

/// Serve the router on `0.0.0.0:{port}` until ctrl-c.
pub async fn serve(client: Arc<FalClient>, port: u16) -> std::io::Result<()> {
    let app = router(client);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("HTTP front-end listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("HTTP front-end shutting down");
        })
        .await
}

/// Parse a request body, tolerating garbage as an empty mapping.
fn lenient_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| json!({}))
}

/// Non-empty string field, Python-truthiness style (empty counts as missing).
fn str_field<'a>(data: &'a Value, name: &str) -> Option<&'a str> {
    data.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
}

/// Outcome envelope with 200 on success, 500 on vendor failure.
fn respond(outcome: Outcome) -> (StatusCode, Json<Value>) {
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome.as_json()))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "service": SERVICE_NAME }))
}

async fn edit_flux(
    State(client): State<Arc<FalClient>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let data = lenient_json(&body);
    let strength = data.get("strength").and_then(Value::as_f64).unwrap_or(0.8);
    let (Some(image_url), Some(prompt)) = (str_field(&data, "image_url"), str_field(&data, "prompt"))
    else {
        return bad_request("image_url and prompt are required");
    };
    respond(client.edit_image_flux(image_url, prompt, strength).await)
}

async fn edit_qwen(
    State(client): State<Arc<FalClient>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let data = lenient_json(&body);
    let (Some(image_url), Some(prompt)) = (str_field(&data, "image_url"), str_field(&data, "prompt"))
    else {
        return bad_request("image_url and prompt are required");
    };
    respond(client.edit_image_qwen(image_url, prompt).await)
}

async fn remove_bg(
    State(client): State<Arc<FalClient>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let data = lenient_json(&body);
    let Some(image_url) = str_field(&data, "image_url") else {
        return bad_request("image_url is required");
    };
    respond(client.remove_background(image_url).await)
}

async fn upscale(
    State(client): State<Arc<FalClient>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let data = lenient_json(&body);
    let scale = data.get("scale").and_then(Value::as_i64).unwrap_or(2);
    let Some(image_url) = str_field(&data, "image_url") else {
        return bad_request("image_url is required");
    };
    respond(client.upscale_image(image_url, scale).await)
}

// =============================================================================
// Tests
// =============================================================================
