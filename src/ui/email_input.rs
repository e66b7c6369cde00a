use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let field = Paragraph::new(input_line(app)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                " Email ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(field, chunks[0]);

    let hint = Paragraph::new(Span::styled(
        "Press tab to return",
        Style::default().fg(Color::Gray),
    ));
    frame.render_widget(hint, chunks[1]);
}

/// Field text with the cursor cell drawn reversed
fn input_line(app: &App) -> Line<'static> {
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);

    if app.input.is_empty() {
        let mut placeholder = app.input.placeholder.chars();
        let first = placeholder.next().map(String::from).unwrap_or_default();
        return Line::from(vec![
            Span::styled(first, cursor_style.fg(Color::DarkGray)),
            Span::styled(
                placeholder.collect::<String>(),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
    }

    let chars: Vec<char> = app.input.value().chars().collect();
    let at = app.input.cursor();
    let before: String = chars[..at].iter().collect();
    let under = chars.get(at).map(|c| c.to_string()).unwrap_or_else(|| " ".into());
    let after: String = chars.get(at + 1..).unwrap_or_default().iter().collect();

    Line::from(vec![
        Span::raw(before),
        Span::styled(under, cursor_style),
        Span::raw(after),
    ])
}
