//! Generic resource framework
//!
//! Every per-service package plugs the same four abstractions into the
//! [`registry`]: a DAO that fetches [`Resource`]s, a [`Renderer`] that
//! maps them to table/detail views, a list of [`Action`]s, and an
//! executor for the API-typed ones.
//!
//! # Architecture
//!
//! - [`resource`] - uniform read-only view over one fetched API object
//! - [`dao`] - list/get/delete contract with capability declarations
//! - [`registry`] - startup-built directory of views, actions, executors
//! - [`action`] - action descriptors and the confirmation suffix rule
//! - [`command`] - `${VAR}` expansion and shell dispatch for exec actions
//! - [`render`] - pure presentation contract plus table-fitting helpers
//! - [`navigate`] - CloudFormation type-string to view-key mapping
//! - [`aggregate`] - partial-failure fan-out merging
//! - [`readonly`] - the read-only mode allowlists
//! - [`error`] - shared error taxonomy and kind classification

pub mod action;
pub mod aggregate;
pub mod command;
pub mod dao;
pub mod error;
pub mod navigate;
pub mod readonly;
pub mod registry;
pub mod render;
pub mod resource;

pub use action::{confirm_matches, confirm_suffix, Action, ActionResult, ConfirmLevel};
pub use dao::{list_all, Dao, Op, Page};
pub use error::{Error, ErrorKind, Result};
pub use registry::{Executor, Registry, RegistryBuilder, ViewScope};
pub use render::{Column, Renderer, SummaryEntry};
pub use resource::{field, items_at, JsonResource, Resource, Tags};
