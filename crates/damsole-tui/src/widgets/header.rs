// Panel header: assistant title and an online/typing status line.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::{section_border_style, ACCENT};
use crate::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (status_text, status_color) = status_indicator(state.busy);

    let lines = vec![
        Line::from(Span::styled(
            state.title.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("● ", Style::default().fg(status_color)),
            Span::styled(status_text, Style::default().fg(Color::Gray)),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(section_border_style(state.busy)),
    );
    frame.render_widget(paragraph, area);
}

/// Status text and dot color.
pub fn status_indicator(busy: bool) -> (&'static str, Color) {
    if busy {
        ("typing...", Color::Yellow)
    } else {
        ("online", Color::Green)
    }
}
