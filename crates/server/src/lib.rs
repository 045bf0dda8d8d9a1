//! DefiLlama proxy server
//!
//! Exposes the DefiLlama accessors as plain HTTP endpoints, a periodic SSE
//! push channel and an MCP tool server on stdio.

pub mod mcp;
pub mod routes;
pub mod server;
pub mod stream;

pub use mcp::ToolServer;
pub use routes::{create_router, AppState};
pub use server::{HttpServer, HttpServerBuilder};
pub use stream::{Frame, PushLoop, PushSummary, StopReason};
