//! # Fal Gateway - fal.ai image-editing adapter
//!
//! Thin adapter exposing four fal.ai image operations (FLUX edit, Qwen edit,
//! background removal, ESRGAN upscaling) through two front-ends:
//! - An MCP stdio server (JSON-RPC 2.0 over stdin/stdout) for AI-agent clients
//! - A minimal HTTP API for direct callers
//!
//! ## Architecture
//!
//! ```text
//!   MCP client ──stdio──► mcp::McpServer ──┐
//!                                          ├──► registry (schemas, defaults)
//!   HTTP caller ──POST──► http::router ────┤
//!                                          └──► client::FalClient ──► fal.ai
//! ```
//!
//! Every invocation resolves to exactly one [`client::Outcome`] (success or
//! failure) before the front-end responds; the client never raises outward.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod client;
pub mod http;
pub mod mcp;
pub mod registry;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
