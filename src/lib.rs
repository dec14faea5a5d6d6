//! awscope, a terminal UI for AWS
//!
//! Navigate, observe, and manage AWS resources from the terminal. The
//! crate is organized around a small plugin framework: per-service
//! packages register a DAO, a renderer, and actions into a registry
//! built once at startup, and the generic UI drives everything through
//! those contracts.

pub mod app;
pub mod aws;
pub mod config;
pub mod event;
pub mod framework;
pub mod services;
pub mod ui;

/// Version injected at compile time via AWSCOPE_VERSION env var (set by
/// CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("AWSCOPE_VERSION") {
    Some(v) => v,
    None => "dev",
};
