// Launcher badge: the floating button in the bottom-right corner.
//
// Shows "Chat" while the panel is closed and "Close" while it is open.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::ACCENT;
use crate::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    frame.render_widget(Clear, area);

    let (label, key_hint) = label(state.panel_open);
    let line = Line::from(vec![
        Span::styled(
            label,
            Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(key_hint, Style::default().fg(Color::DarkGray)),
    ]);

    let paragraph = Paragraph::new(line).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT)),
    );
    frame.render_widget(paragraph, area);
}

/// Badge text and key hint for the current panel state.
pub fn label(panel_open: bool) -> (&'static str, &'static str) {
    if panel_open {
        (" Close ", " esc")
    } else {
        (" Chat ", " c")
    }
}
