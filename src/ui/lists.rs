use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;

const COLUMN_WIDTH: u16 = 32;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(COLUMN_WIDTH), Constraint::Min(0)])
        .split(area);

    render_actions(frame, app, chunks[0]);
    render_side_panel(frame, app, chunks[1]);
}

fn render_actions(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            // A disabled entry never looks selected, even with the cursor on it
            let is_selected = i == app.cursor && !action.disabled;
            let style = if action.disabled {
                Style::default().fg(Color::DarkGray)
            } else if is_selected {
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let prefix = if is_selected { "> " } else { "  " };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}", prefix, action.label),
                style,
            )))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::RIGHT | Borders::TOP)
            .title(" Commands ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    let mut state = ListState::default();
    state.select(Some(app.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mut block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    if !app.side_panel.title.is_empty() {
        block = block.title(format!(" {} ", app.side_panel.title));
    }

    let lines: Vec<Line> = app
        .side_panel
        .lines
        .iter()
        .map(|l| Line::from(Span::raw(l.as_str())))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
