//! Remote operation client — outbound calls to the fal.ai vendor API.
//!
//! One generic executor drives all four operations from the registry's data
//! rows. Every call resolves to an [`Outcome`]; transport and parsing errors
//! are logged and folded into `Outcome::Failure`, never propagated. At most
//! one outbound POST per invocation, no retries, no backoff.

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::registry::{Caption, OperationEntry, Registry, ResponseField};
use crate::types::{Config, Error, Result};

/// Normalized result of one operation invocation.
///
/// Two-variant by contract: the client never raises outward, so every
/// invocation produces exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        image_url: String,
        model: String,
        prompt: String,
    },
    Failure {
        error: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Wire envelope: `{"success": true, ...}` / `{"success": false, "error"}`.
    pub fn as_json(&self) -> Value {
        match self {
            Outcome::Success {
                image_url,
                model,
                prompt,
            } => json!({
                "success": true,
                "image_url": image_url,
                "model": model,
                "prompt": prompt,
            }),
            Outcome::Failure { error } => json!({
                "success": false,
                "error": error,
            }),
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Outcome::Failure {
            error: error.into(),
        }
    }
}

/// Client for the fal.ai image API.
#[derive(Debug)]
pub struct FalClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    registry: Arc<Registry>,
}

impl FalClient {
    pub fn new(config: &Config, registry: Arc<Registry>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            registry,
        }
    }

    /// Edit an image with the FLUX image-to-image model.
    pub async fn edit_image_flux(&self, image_url: &str, prompt: &str, strength: f64) -> Outcome {
        self.call(
            "edit_image_flux",
            json!({
                "image_url": image_url,
                "prompt": prompt,
                "strength": strength,
            }),
        )
        .await
    }

    /// Edit an image with the Qwen image-edit model (better for text edits).
    pub async fn edit_image_qwen(&self, image_url: &str, prompt: &str) -> Outcome {
        self.call(
            "edit_image_qwen",
            json!({
                "image_url": image_url,
                "prompt": prompt,
            }),
        )
        .await
    }

    /// Remove the background from an image.
    pub async fn remove_background(&self, image_url: &str) -> Outcome {
        self.call("remove_background", json!({ "image_url": image_url }))
            .await
    }

    /// Upscale an image by the given factor.
    pub async fn upscale_image(&self, image_url: &str, scale: i64) -> Outcome {
        self.call(
            "upscale_image",
            json!({
                "image_url": image_url,
                "scale": scale,
            }),
        )
        .await
    }

    async fn call(&self, name: &str, args: Value) -> Outcome {
        let Some(entry) = self.registry.get(name) else {
            // Unreachable with the standard registry; kept total.
            return Outcome::failure(format!("Unknown tool '{name}'"));
        };
        let args = args.as_object().cloned().unwrap_or_default();
        self.execute(entry, &args).await
    }

    /// Generic executor: build the vendor body from the (defaults-filled)
    /// argument map plus the entry's fixed parameters, POST, map the response.
    pub async fn execute(&self, entry: &OperationEntry, args: &Map<String, Value>) -> Outcome {
        match self.post_operation(entry, args).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(operation = entry.name, "vendor call failed: {err}");
                Outcome::failure(err.to_string())
            }
        }
    }

    async fn post_operation(
        &self,
        entry: &OperationEntry,
        args: &Map<String, Value>,
    ) -> Result<Outcome> {
        let mut body = args.clone();
        if let Some(extra) = entry.extra_body.as_object() {
            for (key, value) in extra {
                body.insert(key.clone(), value.clone());
            }
        }

        let url = format!("{}{}", self.base_url, entry.endpoint);
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&Value::Object(body))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Ok(Outcome::failure(format!(
                "API request failed: {} {}",
                status.as_u16(),
                text
            )));
        }

        let payload: Value = response.json().await?;
        let image_url = extract_image_url(entry.response_field, &payload).ok_or_else(|| {
            Error::internal(format!(
                "missing image URL in {} response",
                entry.model_label
            ))
        })?;

        Ok(Outcome::Success {
            image_url,
            model: entry.model_label.to_string(),
            prompt: caption(entry, args),
        })
    }
}

/// Pull the result image URL out of the vendor response body.
fn extract_image_url(field: ResponseField, payload: &Value) -> Option<String> {
    let url = match field {
        ResponseField::Images => payload.get("images")?.get(0)?.get("url")?,
        ResponseField::Image => payload.get("image")?.get("url")?,
    };
    url.as_str().map(str::to_string)
}

/// Human-readable description reported alongside a successful result.
fn caption(entry: &OperationEntry, args: &Map<String, Value>) -> String {
    match &entry.caption {
        Caption::FromPrompt => args
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Caption::Fixed(text) => (*text).to_string(),
        Caption::ScaleFactor => {
            let scale = args.get("scale").and_then(Value::as_i64).unwrap_or(2);
            format!("Upscale {scale}x")
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
