//! Core types shared by the DefiLlama proxy crates
//!
//! - Static proxy configuration and its fixed defaults
//! - Accessor identities and post-processing constants
//! - Upstream outcome and shape error types

pub mod types;
pub mod config;
pub mod errors;

pub use self::types::*;
pub use self::config::*;
pub use self::errors::*;
