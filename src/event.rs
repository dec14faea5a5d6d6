//! Event Handling
//!
//! Keyboard and event handling for awscope.

use crate::app::{App, Mode};
use crate::framework::registry::ViewScope;
use crate::framework::render::Renderer;
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;

/// Handle events, returns true if app should quit
pub async fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return handle_key_event(app, key.code, key.modifiers).await;
        }
    }
    Ok(false)
}

async fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers).await,
        Mode::Command => handle_command_mode(app, code).await,
        Mode::Help => handle_dismiss_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code).await,
        Mode::ConfirmToken => handle_confirm_token_mode(app, code).await,
        Mode::Warning => handle_dismiss_mode(app, code),
        Mode::Describe => handle_describe_mode(app, code),
    }
}

async fn handle_normal_mode(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<bool> {
    // Filter input takes priority while active
    if app.filter_active {
        match code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Enter => app.filter_active = false,
            KeyCode::Backspace => {
                app.filter_text.pop();
                app.apply_filter();
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.filter_text.push(c);
                app.apply_filter();
            }
            _ => {}
        }
        return Ok(false);
    }

    match code {
        KeyCode::Char('q') => return Ok(true),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('g') => app.go_to_top(),
        KeyCode::Char('G') => app.go_to_bottom(),

        KeyCode::Char('r') => app.refresh_current().await,
        KeyCode::Char('d') => app.enter_describe(),
        KeyCode::Char('?') => app.mode = Mode::Help,
        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('/') => {
            app.filter_active = true;
            app.filter_text.clear();
        }

        KeyCode::Esc => {
            app.navigate_back().await;
        }

        // Drill into a child view, or jump to the modeled resource.
        KeyCode::Enter => {
            let drill = app.selected_resource().and_then(|r| app.renderer.drill(r));
            if let Some(target) = drill {
                app.drill_into(target).await;
            } else {
                let jump = app.selected_resource().and_then(|r| app.renderer.navigate(r));
                if let Some(target) = jump {
                    app.navigate_to_target(target).await;
                }
            }
        }

        // Action shortcuts from the registry
        KeyCode::Char(c) => {
            let action = app
                .registry
                .actions(&app.service, &app.resource_type)
                .and_then(|actions| actions.iter().find(|a| a.shortcut == c))
                .cloned();
            if let Some(action) = action {
                if app.selected_resource().is_some() {
                    app.invoke_action(action).await;
                }
            }
        }

        _ => {}
    }

    Ok(false)
}

async fn handle_command_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc => app.exit_mode(),
        KeyCode::Tab | KeyCode::Down => {
            if !app.command_suggestions.is_empty() {
                app.command_selected = (app.command_selected + 1) % app.command_suggestions.len();
            }
        }
        KeyCode::Up => {
            if !app.command_suggestions.is_empty() {
                app.command_selected = app
                    .command_selected
                    .checked_sub(1)
                    .unwrap_or(app.command_suggestions.len() - 1);
            }
        }
        KeyCode::Enter => {
            let key = app
                .command_suggestions
                .get(app.command_selected)
                .cloned()
                .unwrap_or_else(|| app.command_text.clone());
            app.exit_mode();

            if let Some((service, resource)) = key.split_once('/') {
                let (service, resource) = (service.to_string(), resource.to_string());
                app.navigate_to(&service, &resource, ViewScope::default())
                    .await;
            } else {
                app.error_message = Some(format!("Unknown resource: {}", key));
            }
        }
        KeyCode::Backspace => {
            app.command_text.pop();
            app.update_command_suggestions();
        }
        KeyCode::Char(c) => {
            app.command_text.push(c);
            app.update_command_suggestions();
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.exit_mode(),
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.selected_yes = true;
            }
            app.confirm_pending().await;
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.selected_yes = !pending.selected_yes;
            }
        }
        KeyCode::Enter => app.confirm_pending().await,
        _ => {}
    }
    Ok(false)
}

async fn handle_confirm_token_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc => app.exit_mode(),
        KeyCode::Enter => app.confirm_pending_token().await,
        KeyCode::Backspace => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_dismiss_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
        app.exit_mode();
    }
    Ok(false)
}

fn handle_describe_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => app.exit_mode(),
        KeyCode::Char('j') | KeyCode::Down => app.describe_scroll += 1,
        KeyCode::Char('k') | KeyCode::Up => {
            app.describe_scroll = app.describe_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => app.describe_scroll = 0,
        _ => {}
    }
    Ok(false)
}
