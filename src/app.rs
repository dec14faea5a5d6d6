//! Application State
//!
//! Central application state management for awscope. The app resolves
//! the current view's DAO and renderer through the registry, holds the
//! fetched resources, and drives the action confirmation flow.

use crate::aws::client::{format_aws_error, AwsClient};
use crate::config::Config;
use crate::framework::action::{confirm_suffix, Action, ActionResult, ConfirmLevel};
use crate::framework::command::{self, ShellResult};
use crate::framework::dao::list_all;
use crate::framework::navigate::NavTarget;
use crate::framework::registry::{Registry, ViewScope};
use crate::framework::render::Renderer;
use crate::framework::resource::Resource;
use crate::framework::Error;
use crate::services;
use std::sync::Arc;

/// Pages fetched from paginated DAOs
const DEFAULT_PAGE_SIZE: usize = 100;

/// Application modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,       // Viewing list
    Command,      // : command input
    Help,         // ? help popup
    Confirm,      // Simple yes/no dialog
    ConfirmToken, // Dangerous typed-token dialog
    Warning,      // Warning/info dialog (OK only)
    Describe,     // Viewing details of selected item
}

/// Action awaiting confirmation
pub struct PendingAction {
    pub action: Action,
    pub resource_index: usize,
    pub message: String,
    pub selected_yes: bool,
    /// The string the user must type, for dangerous actions.
    pub expected: Option<String>,
    pub input: String,
}

/// View we drilled down from
pub struct ParentContext {
    pub service: String,
    pub resource_type: String,
    pub scope: ViewScope,
    pub display: String,
}

/// Main application state
pub struct App {
    pub client: Arc<AwsClient>,
    pub registry: Arc<Registry>,
    pub config: Config,

    // Current view
    pub service: String,
    pub resource_type: String,
    pub scope: ViewScope,
    pub renderer: Box<dyn Renderer>,

    // Fetched data
    pub resources: Vec<Box<dyn Resource>>,
    pub filtered: Vec<usize>,

    // Navigation state
    pub selected: usize,
    pub mode: Mode,
    pub filter_text: String,
    pub filter_active: bool,
    pub navigation_stack: Vec<ParentContext>,

    // Command input
    pub command_text: String,
    pub command_suggestions: Vec<String>,
    pub command_selected: usize,

    // Confirmation
    pub pending_action: Option<PendingAction>,

    // UI state
    pub loading: bool,
    pub error_message: Option<String>,
    pub warning_message: Option<String>,
    pub status_message: Option<String>,
    pub describe_text: Option<String>,
    pub describe_scroll: usize,

    /// Select this id after the next refresh (cross-resource jumps).
    select_after_refresh: Option<String>,
}

impl App {
    pub fn new(client: Arc<AwsClient>, registry: Arc<Registry>, config: Config) -> Self {
        let (service, resource_type) = services::DEFAULT_VIEW;
        let renderer = registry
            .renderer(service, resource_type)
            .unwrap_or_else(|| Box::new(EmptyRenderer));

        Self {
            client,
            registry,
            config,
            service: service.to_string(),
            resource_type: resource_type.to_string(),
            scope: ViewScope::default(),
            renderer,
            resources: Vec::new(),
            filtered: Vec::new(),
            selected: 0,
            mode: Mode::Normal,
            filter_text: String::new(),
            filter_active: false,
            navigation_stack: Vec::new(),
            command_text: String::new(),
            command_suggestions: Vec::new(),
            command_selected: 0,
            pending_action: None,
            loading: false,
            error_message: None,
            warning_message: None,
            status_message: None,
            describe_text: None,
            describe_scroll: 0,
            select_after_refresh: None,
        }
    }

    pub fn view_key(&self) -> String {
        format!("{}/{}", self.service, self.resource_type)
    }

    pub fn view_title(&self) -> String {
        self.registry
            .title(&self.service, &self.resource_type)
            .map(str::to_string)
            .unwrap_or_else(|| self.view_key())
    }

    pub fn selected_resource(&self) -> Option<&dyn Resource> {
        let index = *self.filtered.get(self.selected)?;
        self.resources.get(index).map(Box::as_ref)
    }

    // =========================================================================
    // Data fetching
    // =========================================================================

    pub async fn refresh_current(&mut self) {
        self.loading = true;
        self.error_message = None;

        let result = match self.registry.dao(
            &self.service,
            &self.resource_type,
            self.client.clone(),
            &self.scope,
        ) {
            Ok(dao) => list_all(dao.as_ref(), DEFAULT_PAGE_SIZE).await,
            Err(e) => Err(e),
        };

        self.loading = false;
        match result {
            Ok(resources) => {
                self.resources = resources;
                self.apply_filter();
                self.restore_selection();
            }
            Err(e) => {
                tracing::warn!("refresh {} failed: {}", self.view_key(), e);
                self.resources.clear();
                self.filtered.clear();
                self.selected = 0;
                self.error_message = Some(format_aws_error(&e));
            }
        }
    }

    fn restore_selection(&mut self) {
        if let Some(wanted) = self.select_after_refresh.take() {
            if let Some(pos) = self
                .filtered
                .iter()
                .position(|&i| self.resources[i].id() == wanted)
            {
                self.selected = pos;
                return;
            }
        }
        self.selected = self.selected.min(self.filtered.len().saturating_sub(1));
    }

    pub fn apply_filter(&mut self) {
        let needle = self.filter_text.to_lowercase();
        self.filtered = (0..self.resources.len())
            .filter(|&i| {
                if needle.is_empty() {
                    return true;
                }
                self.renderer
                    .render_row(self.resources[i].as_ref())
                    .iter()
                    .any(|cell| cell.to_lowercase().contains(&needle))
            })
            .collect();
        self.selected = self.selected.min(self.filtered.len().saturating_sub(1));
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.apply_filter();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub async fn navigate_to(&mut self, service: &str, resource_type: &str, scope: ViewScope) {
        if !self.registry.has_view(service, resource_type) {
            self.error_message = Some(format!("Unknown resource: {}/{}", service, resource_type));
            return;
        }

        let Some(renderer) = self.registry.renderer(service, resource_type) else {
            self.error_message = Some(format!("No renderer for {}/{}", service, resource_type));
            return;
        };

        self.service = service.to_string();
        self.resource_type = resource_type.to_string();
        self.scope = scope;
        self.renderer = renderer;
        self.selected = 0;
        self.clear_filter();
        self.mode = Mode::Normal;
        self.navigation_stack.clear();

        let _ = self.config.set_last_resource(&self.view_key());
        self.refresh_current().await;
    }

    /// Enter a child view keyed on the selected resource.
    pub async fn drill_into(&mut self, target: NavTarget) {
        if !self.registry.has_view(&target.service, &target.resource) {
            return;
        }
        let Some(renderer) = self.registry.renderer(&target.service, &target.resource) else {
            return;
        };

        let display = self
            .selected_resource()
            .map(|r| r.name().to_string())
            .unwrap_or_default();

        self.navigation_stack.push(ParentContext {
            service: std::mem::take(&mut self.service),
            resource_type: std::mem::take(&mut self.resource_type),
            scope: self.scope.clone(),
            display,
        });

        self.service = target.service;
        self.resource_type = target.resource;
        self.scope = ViewScope::of(&target.id);
        self.renderer = renderer;
        self.selected = 0;
        self.clear_filter();
        self.refresh_current().await;
    }

    /// Jump to the view a resource models, selecting it there.
    pub async fn navigate_to_target(&mut self, target: NavTarget) {
        if !self.registry.has_view(&target.service, &target.resource) {
            self.show_warning(&format!(
                "No view registered for {}/{}",
                target.service, target.resource
            ));
            return;
        }

        self.select_after_refresh = Some(target.id.clone());
        self.navigate_to(&target.service, &target.resource, ViewScope::default())
            .await;
    }

    pub async fn navigate_back(&mut self) -> bool {
        let Some(parent) = self.navigation_stack.pop() else {
            return false;
        };

        let Some(renderer) = self
            .registry
            .renderer(&parent.service, &parent.resource_type)
        else {
            return false;
        };

        self.service = parent.service;
        self.resource_type = parent.resource_type;
        self.scope = parent.scope;
        self.renderer = renderer;
        self.selected = 0;
        self.clear_filter();
        self.refresh_current().await;
        true
    }

    // =========================================================================
    // Mode transitions
    // =========================================================================

    pub fn enter_describe(&mut self) {
        let Some(resource) = self.selected_resource() else {
            return;
        };
        self.describe_text = Some(self.renderer.render_detail(resource));
        self.describe_scroll = 0;
        self.mode = Mode::Describe;
    }

    pub fn enter_command_mode(&mut self) {
        self.command_text.clear();
        self.command_selected = 0;
        self.update_command_suggestions();
        self.mode = Mode::Command;
    }

    pub fn update_command_suggestions(&mut self) {
        let needle = self.command_text.to_lowercase();
        self.command_suggestions = self
            .registry
            .view_keys()
            .iter()
            .filter(|key| key.contains(&needle))
            .map(|key| key.to_string())
            .collect();
        self.command_selected = self
            .command_selected
            .min(self.command_suggestions.len().saturating_sub(1));
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.describe_text = None;
        self.warning_message = None;
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Start the invocation flow for an action on the selected row.
    pub async fn invoke_action(&mut self, action: Action) {
        // Authoritative enforcement happens again at dispatch; gating
        // here just spares the user a pointless confirmation dialog.
        if let Err(e) = self.registry.authorize(&action) {
            self.error_message = Some(format_aws_error(&e));
            return;
        }

        let Some(index) = self.filtered.get(self.selected).copied() else {
            return;
        };
        let (id, name) = {
            let resource = self.resources[index].as_ref();
            (resource.id().to_string(), resource.name().to_string())
        };

        match action.confirm {
            ConfirmLevel::None => self.execute_action(action, index).await,
            ConfirmLevel::Simple => {
                self.pending_action = Some(PendingAction {
                    message: format!("{} '{}'?", action.name, name),
                    action,
                    resource_index: index,
                    selected_yes: false,
                    expected: None,
                    input: String::new(),
                });
                self.mode = Mode::Confirm;
            }
            ConfirmLevel::Dangerous => {
                self.pending_action = Some(PendingAction {
                    message: format!("{} '{}'", action.name, name),
                    action,
                    resource_index: index,
                    selected_yes: false,
                    expected: Some(confirm_suffix(&id)),
                    input: String::new(),
                });
                self.mode = Mode::ConfirmToken;
            }
        }
    }

    /// Run a confirmed (or unconfirmed) action.
    pub async fn execute_action(&mut self, action: Action, resource_index: usize) {
        if self.resources.get(resource_index).is_none() {
            return;
        }

        match &action.kind {
            crate::framework::action::ActionKind::Exec {
                command: template,
                skip_aws_env,
            } => {
                let expanded = {
                    let resource = self.resources[resource_index].as_ref();
                    command::expand_variables(template, resource)
                };
                let skip = *skip_aws_env;
                match expanded {
                    Ok(cmd) => self.run_shell(&cmd, skip),
                    Err(e) => self.error_message = Some(format_aws_error(&e)),
                }
            }
            crate::framework::action::ActionKind::Api { .. } => {
                let registry = self.registry.clone();
                let client = self.client.clone();
                let result = {
                    let resource = self.resources[resource_index].as_ref();
                    registry
                        .dispatch(&client, &self.service, &self.resource_type, &action, resource)
                        .await
                };
                self.apply_action_result(result).await;
            }
        }
    }

    fn run_shell(&mut self, cmd: &str, skip_aws_env: bool) {
        let env = self.client.command_env();
        let result = command::execute_with_terminal_handling(|| {
            command::run_command(cmd, &env, skip_aws_env)
        });

        match result {
            Ok(ShellResult::Success) => {
                self.status_message = Some("command completed".to_string());
            }
            Ok(ShellResult::Failed(code)) => {
                self.error_message = Some(format!("command exited with code {}", code));
            }
            Ok(ShellResult::Error(message)) => self.error_message = Some(message),
            Err(e) => self.error_message = Some(format!("terminal error: {:#}", e)),
        }
    }

    async fn apply_action_result(&mut self, result: ActionResult) {
        if result.ok {
            self.status_message = Some(result.message);
            if result.refresh {
                self.refresh_current().await;
            }
        } else {
            let error = result
                .error
                .unwrap_or_else(|| Error::Other(anyhow::anyhow!(result.message)));
            if error.is_expected() {
                tracing::warn!("action failed: {}", error);
            } else {
                tracing::error!("action failed: {}", error);
            }
            self.error_message = Some(format_aws_error(&error));
        }
    }

    /// Enter on a simple confirmation dialog.
    pub async fn confirm_pending(&mut self) {
        let Some(pending) = self.pending_action.take() else {
            return;
        };
        self.mode = Mode::Normal;

        if pending.selected_yes {
            self.execute_action(pending.action, pending.resource_index)
                .await;
        }
    }

    /// Enter on a dangerous typed-token dialog.
    pub async fn confirm_pending_token(&mut self) {
        let Some(pending) = self.pending_action.take() else {
            return;
        };

        let matches = pending
            .expected
            .as_deref()
            .map(|expected| pending.input == expected)
            .unwrap_or(false);

        if matches {
            self.mode = Mode::Normal;
            self.execute_action(pending.action, pending.resource_index)
                .await;
        } else {
            self.mode = Mode::Normal;
            self.show_warning("Confirmation text did not match; action cancelled");
        }
    }

    // =========================================================================
    // Selection movement
    // =========================================================================

    pub fn select_next(&mut self) {
        if !self.filtered.is_empty() {
            self.selected = (self.selected + 1).min(self.filtered.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }
}

/// Placeholder renderer for views with no registered renderer.
struct EmptyRenderer;

impl Renderer for EmptyRenderer {
    fn columns(&self) -> Vec<crate::framework::render::Column> {
        vec![crate::framework::render::Column::new("ID", 40, 0, |r| {
            r.id().to_string()
        })]
    }
}
