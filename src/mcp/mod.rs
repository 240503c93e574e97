//! MCP stdio front-end.
//!
//! JSON-RPC 2.0 over stdin/stdout, serving `initialize`, `tools/list`, and
//! `tools/call` for AI-agent clients.

pub mod dispatch;
pub mod server;

pub use dispatch::Dispatcher;
pub use server::McpServer;
