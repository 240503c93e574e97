//! Operation registry — typed metadata for the four vendor operations.
//!
//! Owns operation *metadata* (schemas, defaults, endpoint paths, response
//! extraction hints), not the outbound calls themselves. One table of four
//! data rows replaces four copies of near-identical schema declaration.
//!
//! Consulted by the MCP front-end for listing, required-argument checks, and
//! default filling. The HTTP front-end hardcodes its per-route checks
//! instead; that asymmetry is intentional and matches the service's
//! observable behavior.

use serde_json::{json, Map, Value};
use std::collections::HashMap;

// =============================================================================
// Parameter definitions
// =============================================================================

/// Parameter kind for operation inputs, carrying schema constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String,
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Integer {
        allowed: Option<Vec<i64>>,
    },
}

/// A single parameter definition for an operation.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub default: Option<Value>,
    pub required: bool,
}

impl ParamDef {
    /// JSON-Schema property object for this parameter.
    fn to_schema(&self) -> Value {
        let mut prop = Map::new();
        match &self.kind {
            ParamKind::String => {
                prop.insert("type".into(), json!("string"));
            }
            ParamKind::Number { minimum, maximum } => {
                prop.insert("type".into(), json!("number"));
                if let Some(min) = minimum {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    prop.insert("maximum".into(), json!(max));
                }
            }
            ParamKind::Integer { allowed } => {
                prop.insert("type".into(), json!("integer"));
                if let Some(values) = allowed {
                    prop.insert("enum".into(), json!(values));
                }
            }
        }
        prop.insert("description".into(), json!(self.description));
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }
}

// =============================================================================
// Operation entry
// =============================================================================

/// Where the result image URL lives in the vendor response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseField {
    /// `images[0].url` (FLUX-style list response).
    Images,
    /// `image.url` (single-image response).
    Image,
}

/// How the human-readable caption for a result is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caption {
    /// Echo the caller's `prompt` argument.
    FromPrompt,
    /// Fixed text (operations with no prompt, e.g. "Remove background").
    Fixed(&'static str),
    /// `"Upscale {scale}x"`, synthesized from the `scale` argument.
    ScaleFactor,
}

/// Complete operation metadata entry: one data row of the dispatch table.
#[derive(Debug, Clone)]
pub struct OperationEntry {
    pub name: &'static str,
    pub description: &'static str,
    /// Vendor POST path, joined onto the configured base URL.
    pub endpoint: &'static str,
    pub params: Vec<ParamDef>,
    /// Fixed human-readable model label reported in results.
    pub model_label: &'static str,
    pub response_field: ResponseField,
    /// Fixed vendor parameters merged into every request body (may be empty).
    pub extra_body: Value,
    pub caption: Caption,
}

impl OperationEntry {
    /// JSON-Schema input object advertised to protocol clients.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(param.name.to_string(), param.to_schema());
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Names of declared-required parameters absent from `args`.
    ///
    /// Null and empty-string values count as absent, matching the
    /// truthiness checks on the HTTP routes.
    pub fn missing_required(&self, args: &Map<String, Value>) -> Vec<&'static str> {
        self.params
            .iter()
            .filter(|p| p.required && !has_value(args, p.name))
            .map(|p| p.name)
            .collect()
    }

    /// Caller-facing message naming this operation's required parameters,
    /// e.g. `"image_url and prompt are required"`.
    pub fn required_error(&self) -> String {
        let names: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        match names.as_slice() {
            [single] => format!("{single} is required"),
            many => format!("{} are required", many.join(" and ")),
        }
    }

    /// Fill in declared defaults for parameters absent from `args`.
    pub fn fill_defaults(&self, args: &mut Map<String, Value>) {
        for param in &self.params {
            if !args.contains_key(param.name) {
                if let Some(default) = &param.default {
                    args.insert(param.name.to_string(), default.clone());
                }
            }
        }
    }
}

fn has_value(args: &Map<String, Value>, name: &str) -> bool {
    match args.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

// =============================================================================
// Registry
// =============================================================================

/// In-memory operation registry. Built once at startup, never mutated after.
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<&'static str, OperationEntry>,
    /// Listing order (stable, matches declaration order).
    order: Vec<&'static str>,
}

impl Registry {
    /// The standard four-operation table.
    pub fn standard() -> Self {
        let entries = vec![
            OperationEntry {
                name: "edit_image_flux",
                description: "Edit an image using FLUX AI model based on a text prompt. \
                    Good for general image editing, style changes, object addition/modification.",
                endpoint: "/fal-ai/flux/dev/image-to-image",
                params: vec![
                    ParamDef {
                        name: "image_url",
                        kind: ParamKind::String,
                        description: "URL of the image to edit (must be publicly accessible)",
                        default: None,
                        required: true,
                    },
                    ParamDef {
                        name: "prompt",
                        kind: ParamKind::String,
                        description: "Description of how to edit the image (e.g., 'add sunglasses \
                            to the person', 'change background to beach')",
                        default: None,
                        required: true,
                    },
                    ParamDef {
                        name: "strength",
                        kind: ParamKind::Number {
                            minimum: Some(0.1),
                            maximum: Some(1.0),
                        },
                        description: "How much to change the image (0.1-1.0, default 0.8). \
                            Lower values preserve more of original.",
                        default: Some(json!(0.8)),
                        required: false,
                    },
                ],
                model_label: "FLUX Dev",
                response_field: ResponseField::Images,
                extra_body: json!({
                    "num_inference_steps": 28,
                    "guidance_scale": 3.5,
                }),
                caption: Caption::FromPrompt,
            },
            OperationEntry {
                name: "edit_image_qwen",
                description: "Edit an image using Qwen AI model. Excellent for text editing, \
                    precise modifications, and detailed edits.",
                endpoint: "/fal-ai/qwen-image-edit",
                params: vec![
                    ParamDef {
                        name: "image_url",
                        kind: ParamKind::String,
                        description: "URL of the image to edit (must be publicly accessible)",
                        default: None,
                        required: true,
                    },
                    ParamDef {
                        name: "prompt",
                        kind: ParamKind::String,
                        description: "Description of how to edit the image",
                        default: None,
                        required: true,
                    },
                ],
                model_label: "Qwen Image Edit",
                response_field: ResponseField::Image,
                extra_body: json!({}),
                caption: Caption::FromPrompt,
            },
            OperationEntry {
                name: "remove_background",
                description: "Remove the background from an image, making it transparent.",
                endpoint: "/fal-ai/imageutils/rembg",
                params: vec![ParamDef {
                    name: "image_url",
                    kind: ParamKind::String,
                    description: "URL of the image to process (must be publicly accessible)",
                    default: None,
                    required: true,
                }],
                model_label: "Background Removal",
                response_field: ResponseField::Image,
                extra_body: json!({}),
                caption: Caption::Fixed("Remove background"),
            },
            OperationEntry {
                name: "upscale_image",
                description: "Upscale an image to higher resolution using AI.",
                endpoint: "/fal-ai/esrgan",
                params: vec![
                    ParamDef {
                        name: "image_url",
                        kind: ParamKind::String,
                        description: "URL of the image to upscale (must be publicly accessible)",
                        default: None,
                        required: true,
                    },
                    ParamDef {
                        name: "scale",
                        kind: ParamKind::Integer {
                            allowed: Some(vec![2, 4, 8]),
                        },
                        description: "Scale factor (2, 4, or 8). Default is 2.",
                        default: Some(json!(2)),
                        required: false,
                    },
                ],
                model_label: "ESRGAN Upscaler",
                response_field: ResponseField::Image,
                extra_body: json!({}),
                caption: Caption::ScaleFactor,
            },
        ];

        let order: Vec<&'static str> = entries.iter().map(|e| e.name).collect();
        let entries = entries.into_iter().map(|e| (e.name, e)).collect();
        Self { entries, order }
    }

    /// Get an operation entry by name.
    pub fn get(&self, name: &str) -> Option<&OperationEntry> {
        self.entries.get(name)
    }

    /// List all entries in declaration order.
    pub fn list_entries(&self) -> Vec<&OperationEntry> {
        self.order.iter().filter_map(|n| self.entries.get(n)).collect()
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn standard_registry_has_four_operations() {
        let registry = Registry::standard();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry
                .list_entries()
                .iter()
                .map(|e| e.name)
                .collect::<Vec<_>>(),
            vec![
                "edit_image_flux",
                "edit_image_qwen",
                "remove_background",
                "upscale_image"
            ]
        );
    }

    #[test]
    fn flux_schema_declares_strength_bounds_and_default() {
        let registry = Registry::standard();
        let schema = registry.get("edit_image_flux").unwrap().input_schema();

        assert_eq!(schema["type"], json!("object"));
        let strength = &schema["properties"]["strength"];
        assert_eq!(strength["type"], "number");
        assert_eq!(strength["minimum"], json!(0.1));
        assert_eq!(strength["maximum"], json!(1.0));
        assert_eq!(strength["default"], json!(0.8));
        assert_eq!(schema["required"], json!(["image_url", "prompt"]));
    }

    #[test]
    fn upscale_schema_enumerates_allowed_scales() {
        let registry = Registry::standard();
        let schema = registry.get("upscale_image").unwrap().input_schema();

        assert_eq!(schema["properties"]["scale"]["enum"], json!([2, 4, 8]));
        assert_eq!(schema["properties"]["scale"]["default"], json!(2));
        assert_eq!(schema["required"], json!(["image_url"]));
    }

    #[test]
    fn missing_required_names_absent_params() {
        let registry = Registry::standard();
        let entry = registry.get("edit_image_flux").unwrap();

        let missing = entry.missing_required(&args(json!({"image_url": "http://x/img.png"})));
        assert_eq!(missing, vec!["prompt"]);

        let missing = entry.missing_required(&args(json!({})));
        assert_eq!(missing, vec!["image_url", "prompt"]);
    }

    #[test]
    fn empty_and_null_values_count_as_missing() {
        let registry = Registry::standard();
        let entry = registry.get("edit_image_flux").unwrap();

        let missing =
            entry.missing_required(&args(json!({"image_url": "", "prompt": ""})));
        assert_eq!(missing, vec!["image_url", "prompt"]);

        let missing = entry.missing_required(&args(
            json!({"image_url": "http://x/img.png", "prompt": null}),
        ));
        assert_eq!(missing, vec!["prompt"]);
    }

    #[test]
    fn required_error_messages_match_wire_format() {
        let registry = Registry::standard();
        assert_eq!(
            registry.get("edit_image_flux").unwrap().required_error(),
            "image_url and prompt are required"
        );
        assert_eq!(
            registry.get("remove_background").unwrap().required_error(),
            "image_url is required"
        );
    }

    #[test]
    fn fill_defaults_inserts_missing_optionals_only() {
        let registry = Registry::standard();
        let entry = registry.get("upscale_image").unwrap();

        let mut params = args(json!({"image_url": "http://x/img.png"}));
        entry.fill_defaults(&mut params);
        assert_eq!(params["scale"], json!(2));

        let mut params = args(json!({"image_url": "http://x/img.png", "scale": 4}));
        entry.fill_defaults(&mut params);
        assert_eq!(params["scale"], json!(4));
    }

    #[test]
    fn unknown_operation_is_absent() {
        let registry = Registry::standard();
        assert!(registry.get("generate_image").is_none());
    }
}
