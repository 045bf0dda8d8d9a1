//! DefiLlama upstream access
//!
//! Features:
//! - Single shared HTTP client with fixed headers and timeout
//! - Fail-silent reads: any I/O failure becomes an absent value
//! - Four accessors with fixed truncation / projection rules

pub mod accessors;
pub mod client;

pub use accessors::{DataSource, LlamaFeed};
pub use client::UpstreamClient;
