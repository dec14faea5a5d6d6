//! AWS transport layer
//!
//! Credentials, SigV4 signing, and the signed HTTP client the DAOs and
//! executors talk through. All responses are normalized to
//! `serde_json::Value` before they leave this layer.

pub mod auth;
pub mod client;
pub mod http;
pub mod sign;
