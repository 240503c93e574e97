//! Tool listing and invocation for the MCP front-end.
//!
//! Every `tools/call` resolves to exactly one tool result; errors are caught
//! at the top of the handler and rendered as error results, never surfaced
//! to the transport loop as protocol failures.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::client::{FalClient, Outcome};
use crate::registry::Registry;
use crate::types::{Error, Result};

/// Validates and routes tool invocations to the vendor client.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    client: Arc<FalClient>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, client: Arc<FalClient>) -> Self {
        Self { registry, client }
    }

    /// `tools/list` result: the registry's schemas verbatim.
    pub fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list_entries()
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.name,
                    "description": entry.description,
                    "inputSchema": entry.input_schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    /// `tools/call` result. Never fails: internal errors render as an
    /// error-flagged tool result.
    pub async fn call_tool(&self, params: &Value) -> Value {
        match self.try_call_tool(params).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("tool dispatch failed: {err}");
                tool_error(format!("Internal error: {err}"))
            }
        }
    }

    async fn try_call_tool(&self, params: &Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("tool name missing from call params"))?;

        let Some(entry) = self.registry.get(name) else {
            return Ok(tool_error(format!("Error: Unknown tool '{name}'")));
        };

        let mut args: Map<String, Value> = params
            .get("arguments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        // Required-argument check happens before any vendor call.
        if !entry.missing_required(&args).is_empty() {
            return Ok(tool_error(format!("Error: {}", entry.required_error())));
        }
        entry.fill_defaults(&mut args);

        let outcome = self.client.execute(entry, &args).await;
        Ok(render_outcome(&outcome))
    }
}

/// Render an outcome as MCP text content.
fn render_outcome(outcome: &Outcome) -> Value {
    match outcome {
        Outcome::Success {
            image_url,
            model,
            prompt,
        } => {
            let text = format!(
                "✅ Image edited successfully!\n\n\
                 **Model:** {model}\n\
                 **Prompt:** {prompt}\n\
                 **Result:** {image_url}"
            );
            tool_result(text, false)
        }
        Outcome::Failure { error } => tool_result(format!("❌ Error editing image: {error}"), true),
    }
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

fn tool_error(text: String) -> Value {
    tool_result(text, true)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Config;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock vendor that counts hits and answers every path with a fixed URL.
    async fn counting_vendor() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/{*path}",
                post(
                    |State(hits): State<Arc<AtomicUsize>>, Json(body): Json<Value>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        // Echo back both shapes; the client reads the one it expects.
                        Json(json!({
                            "images": [{"url": "https://cdn.fal.ai/out/mock.png"}],
                            "image": {"url": "https://cdn.fal.ai/out/mock.png"},
                            "echo": body,
                        }))
                    },
                ),
            )
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn dispatcher(base_url: String) -> Dispatcher {
        let registry = Arc::new(Registry::standard());
        let config = Config {
            api_key: "test-key".to_string(),
            base_url,
            port: 0,
        };
        let client = Arc::new(FalClient::new(&config, registry.clone()));
        Dispatcher::new(registry, client)
    }

    fn result_text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn list_tools_returns_four_schemas() {
        let dispatcher = dispatcher("http://127.0.0.1:1".to_string());
        let listing = dispatcher.list_tools();
        let tools = listing["tools"].as_array().unwrap();

        assert_eq!(tools.len(), 4);
        assert_eq!(tools[0]["name"], json!("edit_image_flux"));
        assert_eq!(
            tools[0]["inputSchema"]["required"],
            json!(["image_url", "prompt"])
        );
    }

    #[tokio::test]
    async fn unknown_tool_names_the_tool() {
        let (base_url, hits) = counting_vendor().await;
        let dispatcher = dispatcher(base_url);

        let result = dispatcher
            .call_tool(&json!({"name": "generate_image", "arguments": {}}))
            .await;

        assert_eq!(result["isError"], json!(true));
        assert_eq!(result_text(&result), "Error: Unknown tool 'generate_image'");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_required_argument_blocks_vendor_call() {
        let (base_url, hits) = counting_vendor().await;
        let dispatcher = dispatcher(base_url);

        let result = dispatcher
            .call_tool(&json!({
                "name": "edit_image_flux",
                "arguments": {"image_url": "http://x/img.png"},
            }))
            .await;

        assert_eq!(result["isError"], json!(true));
        assert_eq!(
            result_text(&result),
            "Error: image_url and prompt are required"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_string_arguments_block_vendor_call() {
        let (base_url, hits) = counting_vendor().await;
        let dispatcher = dispatcher(base_url);

        let result = dispatcher
            .call_tool(&json!({
                "name": "edit_image_flux",
                "arguments": {"image_url": "", "prompt": ""},
            }))
            .await;

        assert_eq!(result["isError"], json!(true));
        assert_eq!(
            result_text(&result),
            "Error: image_url and prompt are required"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_call_renders_text_block() {
        let (base_url, hits) = counting_vendor().await;
        let dispatcher = dispatcher(base_url);

        let result = dispatcher
            .call_tool(&json!({
                "name": "edit_image_qwen",
                "arguments": {"image_url": "http://x/img.png", "prompt": "fix the text"},
            }))
            .await;

        assert_eq!(result["isError"], json!(false));
        let text = result_text(&result);
        assert!(text.starts_with("✅ Image edited successfully!"));
        assert!(text.contains("**Model:** Qwen Image Edit"));
        assert!(text.contains("**Prompt:** fix the text"));
        assert!(text.contains("**Result:** https://cdn.fal.ai/out/mock.png"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn defaults_applied_before_vendor_call() {
        let (base_url, _hits) = counting_vendor().await;
        let dispatcher = dispatcher(base_url);

        let result = dispatcher
            .call_tool(&json!({
                "name": "upscale_image",
                "arguments": {"image_url": "http://x/img.png"},
            }))
            .await;

        assert_eq!(result["isError"], json!(false));
        assert!(result_text(&result).contains("**Prompt:** Upscale 2x"));
    }

    #[tokio::test]
    async fn vendor_failure_renders_error_line() {
        // Nothing listening: the client folds the transport error into Failure.
        let dispatcher = dispatcher("http://127.0.0.1:1".to_string());

        let result = dispatcher
            .call_tool(&json!({
                "name": "remove_background",
                "arguments": {"image_url": "http://x/img.png"},
            }))
            .await;

        assert_eq!(result["isError"], json!(true));
        assert!(result_text(&result).starts_with("❌ Error editing image: "));
    }

    #[tokio::test]
    async fn malformed_params_render_internal_error() {
        let dispatcher = dispatcher("http://127.0.0.1:1".to_string());

        let result = dispatcher.call_tool(&json!({"arguments": {}})).await;

        assert_eq!(result["isError"], json!(true));
        assert!(result_text(&result).starts_with("Internal error: "));
    }
}
