//! Terminal User Interface rendering module
//!
//! All UI rendering for awscope using the ratatui framework: a generic
//! resource table driven by the current view's renderer, a describe
//! view, and the overlay dialogs.
//!
//! # Architecture
//!
//! - `header` - Header bar with profile/region/view info
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Confirmation dialogs (yes/no and typed-token)
//! - `command_box` - Command mode input (`:` key)
//!
//! Tables are rebuilt from the renderer every frame; under narrow
//! terminals low-priority columns are dropped before anything is
//! truncated.

mod command_box;
mod dialog;
mod header;
mod help;

use crate::app::{App, Mode};
use crate::framework::render::{fit_columns, Renderer};
use crate::framework::resource::Resource;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Footer/crumb
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);

    match app.mode {
        Mode::Describe => render_describe_view(f, app, chunks[1]),
        _ => render_main_content(f, app, chunks[1]),
    }

    render_crumb(f, app, chunks[2]);

    // Overlays
    match app.mode {
        Mode::Help => help::render(f),
        Mode::Confirm | Mode::ConfirmToken | Mode::Warning => dialog::render(f, app),
        Mode::Command => command_box::render(f, app),
        _ => {}
    }
}

fn render_main_content(f: &mut Frame, app: &mut App, area: Rect) {
    let show_filter = app.filter_active || !app.filter_text.is_empty();

    if show_filter {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);

        render_filter_bar(f, app, chunks[0]);
        render_table(f, app, chunks[1]);
    } else {
        render_table(f, app, area);
    }
}

fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let cursor_style = if app.filter_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let filter_display = if app.filter_active {
        format!("/{}_", app.filter_text)
    } else {
        format!("/{}", app.filter_text)
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(filter_display, cursor_style)));
    f.render_widget(paragraph, area);
}

/// Generic table over the current view's renderer
fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let count = app.filtered.len();
    let total = app.resources.len();

    let title = if app.filter_text.is_empty() {
        format!(" {}[{}] ", app.view_title(), count)
    } else {
        format!(" {}[{}/{}] ", app.view_title(), count, total)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.loading {
        let msg = Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow));
        f.render_widget(msg, inner);
        return;
    }

    if let Some(error) = &app.error_message {
        let msg = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(ratatui::widgets::Wrap { trim: true });
        f.render_widget(msg, inner);
        return;
    }

    if count == 0 {
        let msg = Paragraph::new("No resources").style(Style::default().fg(Color::DarkGray));
        f.render_widget(msg, inner);
        return;
    }

    let columns = app.renderer.columns();
    let kept = fit_columns(&columns, inner.width);

    let header_cells: Vec<Cell> = kept
        .iter()
        .map(|&i| {
            Cell::from(columns[i].name).style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    let header_row = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .filtered
        .iter()
        .map(|&index| {
            let resource = app.resources[index].as_ref();
            let full = app.renderer.render_row(resource);
            let cells: Vec<Cell> = kept
                .iter()
                .map(|&i| Cell::from(full.get(i).cloned().unwrap_or_default()))
                .collect();
            Row::new(cells).height(1)
        })
        .collect();

    let widths: Vec<Constraint> = kept
        .iter()
        .map(|&i| Constraint::Length(columns[i].width))
        .collect();

    let table = Table::new(rows, widths)
        .header(header_row)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(table, inner, &mut state);
}

fn render_describe_view(f: &mut Frame, app: &App, area: Rect) {
    let title = app
        .selected_resource()
        .map(|r| format!(" {} ", r.name()))
        .unwrap_or_else(|| " Describe ".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let text = app.describe_text.as_deref().unwrap_or("");
    let paragraph = Paragraph::new(text)
        .block(block)
        .scroll((app.describe_scroll as u16, 0));
    f.render_widget(paragraph, area);
}

fn render_crumb(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.view_key()),
        Style::default().fg(Color::Black).bg(Color::Cyan),
    )];

    for parent in &app.navigation_stack {
        spans.push(Span::styled(
            format!(" < {} ", parent.display),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(status) = &app.status_message {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
