//! HTTP client for the TikSight backend API.
//!
//! This crate provides:
//! - Import submission and per-job progress polling
//! - Video library retrieval
//! - Explicit per-request timeouts and application-level error mapping

pub mod client;
pub mod config;
pub mod error;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
