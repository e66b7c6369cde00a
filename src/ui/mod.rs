mod email_input;
mod lists;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Mode};
use crate::types::Severity;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Draw the whole screen from `app`. Reads state only.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0]);

    match app.mode {
        Mode::Input => email_input::render(frame, app, chunks[1]),
        Mode::Default | Mode::Loading => lists::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Press ctrl+q to quit.",
        Style::default().fg(Color::Gray),
    )));
    frame.render_widget(footer, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![Span::styled(
        "tokentui",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Blue,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let user = app
        .current_user
        .as_ref()
        .map(|u| u.email.as_str())
        .unwrap_or("NONE");
    let user_width = (" USER ".len() + user.chars().count() + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(user_width)])
        .split(area);

    let description = if app.mode == Mode::Loading {
        format!(
            "{} {}",
            SPINNER[app.spinner_frame % SPINNER.len()],
            app.status.message
        )
    } else {
        app.status.message.clone()
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.status.severity),
            Style::default()
                .fg(Color::White)
                .bg(severity_color(app.status.severity))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            description,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    let user_nugget = Paragraph::new(Line::from(vec![
        Span::styled(" USER ", Style::default().fg(Color::White).bg(Color::Magenta)),
        Span::styled(
            format!(" {} ", user),
            Style::default().fg(Color::White).bg(Color::Indexed(57)),
        ),
    ]));

    frame.render_widget(status, chunks[0]);
    frame.render_widget(user_nugget, chunks[1]);
}
