//! Header bar
//!
//! Session context (profile, region), the current view, a read-only
//! badge, and the selected resource's summary entries.

use crate::app::App;
use crate::framework::render::Renderer;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let mut context = vec![
        Span::styled(
            format!(" awscope {} ", crate::VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("profile:{} ", app.client.profile().unwrap_or("default")),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("region:{} ", app.client.region()),
            Style::default().fg(Color::White),
        ),
    ];

    if app.registry.read_only() {
        context.push(Span::styled(
            " READ-ONLY ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let mut lines = vec![Line::from(context)];

    // Selected resource summary
    if let Some(resource) = app.selected_resource() {
        let mut summary: Vec<Span> = Vec::new();
        for entry in app.renderer.render_summary(resource) {
            summary.push(Span::styled(
                format!(" {}:", entry.label),
                Style::default().fg(Color::DarkGray),
            ));
            summary.push(Span::styled(
                entry.value,
                Style::default().fg(Color::White),
            ));
        }
        lines.push(Line::from(summary));
    } else {
        lines.push(Line::from(""));
    }

    // Action hints for the current view
    let mut hints: Vec<Span> = Vec::new();
    for action in app
        .registry
        .actions(&app.service, &app.resource_type)
        .unwrap_or(&[])
    {
        hints.push(Span::styled(
            format!(" <{}>", action.shortcut),
            Style::default().fg(Color::Yellow),
        ));
        hints.push(Span::styled(
            format!("{} ", action.name),
            Style::default().fg(Color::DarkGray),
        ));
    }
    hints.push(Span::styled(" <?>", Style::default().fg(Color::Yellow)));
    hints.push(Span::styled("help", Style::default().fg(Color::DarkGray)));
    lines.push(Line::from(hints));

    f.render_widget(Paragraph::new(lines), area);
}
