//! View registry
//!
//! The registry is the directory every per-service package plugs into:
//! DAO factories, renderer factories, action lists, and API-action
//! executors, keyed by `service/resource`. It is built explicitly at
//! startup through [`RegistryBuilder`] and is immutable afterwards;
//! the only runtime toggle is the read-only flag.

use super::action::{Action, ActionKind, ActionResult};
use super::dao::Dao;
use super::error::{Error, Result};
use super::readonly;
use super::render::Renderer;
use super::resource::Resource;
use crate::aws::client::AwsClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Narrowing context for views that list children of another resource
/// (stack resources of one stack).
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    pub parent_id: Option<String>,
}

impl ViewScope {
    pub fn of(parent_id: &str) -> Self {
        Self {
            parent_id: Some(parent_id.to_string()),
        }
    }
}

pub type DaoFactory =
    Box<dyn Fn(Arc<AwsClient>, &ViewScope) -> Result<Box<dyn Dao>> + Send + Sync>;

pub type RendererFactory = Box<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

/// Executes the API-typed actions registered for one view.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        client: &AwsClient,
        action: &Action,
        resource: &dyn Resource,
    ) -> ActionResult;
}

fn view_key(service: &str, resource: &str) -> String {
    format!("{}/{}", service, resource)
}

#[derive(Default)]
pub struct RegistryBuilder {
    titles: HashMap<String, String>,
    daos: HashMap<String, DaoFactory>,
    renderers: HashMap<String, RendererFactory>,
    actions: HashMap<String, Vec<Action>>,
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl RegistryBuilder {
    pub fn register_view(&mut self, service: &str, resource: &str, title: &str) {
        self.titles
            .insert(view_key(service, resource), title.to_string());
    }

    pub fn register_dao(&mut self, service: &str, resource: &str, factory: DaoFactory) {
        self.daos.insert(view_key(service, resource), factory);
    }

    pub fn register_renderer(&mut self, service: &str, resource: &str, factory: RendererFactory) {
        self.renderers.insert(view_key(service, resource), factory);
    }

    pub fn register_actions(&mut self, service: &str, resource: &str, actions: Vec<Action>) {
        self.actions.insert(view_key(service, resource), actions);
    }

    pub fn register_executor(
        &mut self,
        service: &str,
        resource: &str,
        executor: Arc<dyn Executor>,
    ) {
        self.executors.insert(view_key(service, resource), executor);
    }

    /// Close the registry for writes.
    pub fn build(self) -> Registry {
        Registry {
            titles: self.titles,
            daos: self.daos,
            renderers: self.renderers,
            actions: self.actions,
            executors: self.executors,
            read_only: AtomicBool::new(false),
        }
    }
}

pub struct Registry {
    titles: HashMap<String, String>,
    daos: HashMap<String, DaoFactory>,
    renderers: HashMap<String, RendererFactory>,
    actions: HashMap<String, Vec<Action>>,
    executors: HashMap<String, Arc<dyn Executor>>,
    read_only: AtomicBool,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Instantiate the DAO for a view.
    pub fn dao(
        &self,
        service: &str,
        resource: &str,
        client: Arc<AwsClient>,
        scope: &ViewScope,
    ) -> Result<Box<dyn Dao>> {
        let key = view_key(service, resource);
        match self.daos.get(&key) {
            Some(factory) => factory(client, scope),
            None => Err(Error::NotFound {
                what: format!("view {}", key),
            }),
        }
    }

    pub fn renderer(&self, service: &str, resource: &str) -> Option<Box<dyn Renderer>> {
        self.renderers
            .get(&view_key(service, resource))
            .map(|factory| factory())
    }

    /// Actions registered for a view; `None` for unknown keys.
    pub fn actions(&self, service: &str, resource: &str) -> Option<&[Action]> {
        self.actions
            .get(&view_key(service, resource))
            .map(Vec::as_slice)
    }

    pub fn title(&self, service: &str, resource: &str) -> Option<&str> {
        self.titles.get(&view_key(service, resource)).map(String::as_str)
    }

    /// All registered view keys, sorted (command-mode autocomplete).
    pub fn view_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.titles.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn has_view(&self, service: &str, resource: &str) -> bool {
        self.titles.contains_key(&view_key(service, resource))
    }

    pub fn has_executor(&self, service: &str, resource: &str) -> bool {
        self.executors.contains_key(&view_key(service, resource))
    }

    pub fn set_read_only(&self, on: bool) {
        self.read_only.store(on, Ordering::Relaxed);
    }

    pub fn read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }

    /// Gate an action before dispatch.
    ///
    /// Well-formedness is checked before the read-only flag so a
    /// misconfigured action surfaces as such instead of a misleading
    /// "denied" message.
    pub fn authorize(&self, action: &Action) -> Result<()> {
        match &action.kind {
            ActionKind::Api { operation } if operation.is_empty() => {
                return Err(Error::Misconfigured(format!(
                    "action '{}' has an empty operation",
                    action.name
                )));
            }
            ActionKind::Exec { command, .. } if command.is_empty() => {
                return Err(Error::Misconfigured(format!(
                    "action '{}' has an empty command",
                    action.name
                )));
            }
            _ => {}
        }

        if self.read_only() && !readonly::is_allowed_in_read_only(action) {
            return Err(Error::ReadOnlyDenied);
        }

        Ok(())
    }

    /// Dispatch an API-typed action to its registered executor.
    ///
    /// Exec actions never come through here; they run on the shell
    /// path after the same [`Registry::authorize`] gate. A missing
    /// executor fails closed.
    pub async fn dispatch(
        &self,
        client: &AwsClient,
        service: &str,
        resource_type: &str,
        action: &Action,
        resource: &dyn Resource,
    ) -> ActionResult {
        if let Err(e) = self.authorize(action) {
            return ActionResult::failure(e);
        }

        let operation = match &action.kind {
            ActionKind::Api { operation } => operation,
            ActionKind::Exec { .. } => {
                return ActionResult::failure(Error::Misconfigured(format!(
                    "exec action '{}' dispatched through the API path",
                    action.name
                )));
            }
        };

        let key = view_key(service, resource_type);
        let Some(executor) = self.executors.get(&key) else {
            return ActionResult::failure(Error::Misconfigured(format!(
                "unknown operation {}: no executor registered for {}",
                operation, key
            )));
        };

        tracing::info!(
            "dispatch: view={}, operation={}, resource={}",
            key,
            operation,
            resource.id()
        );

        executor.execute(client, action, resource).await
    }
}
