// Composer: the multi-line message input with its send affordance.
//
// Grows one row per line up to the configured maximum, then keeps the newest
// lines in view. The send hint is disabled while a request is in flight.

use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::section_border_style;
use crate::{Focus, ViewState};

const PLACEHOLDER: &str = "Type your message...";

/// Total composer height including borders.
pub fn composer_height(text: &str, max_lines: u16) -> u16 {
    let lines = text.split('\n').count().min(u16::MAX as usize) as u16;
    lines.clamp(1, max_lines.max(1)) + 2
}

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let visible_rows = area.height.saturating_sub(2) as usize;
    let all_lines: Vec<&str> = state.composer.split('\n').collect();
    let first_visible = all_lines.len().saturating_sub(visible_rows.max(1));
    let visible = &all_lines[first_visible..];

    let content: Vec<Line> = if state.composer.is_empty() {
        vec![Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        visible.iter().map(|l| Line::raw(l.to_string())).collect()
    };

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(section_border_style(state.busy))
            .title(" Message ")
            .title_bottom(send_hint(state.busy)),
    );
    frame.render_widget(paragraph, area);

    if state.focus == Focus::Composer && area.width > 2 && area.height > 2 {
        let last = visible.last().copied().unwrap_or_default();
        let column = (last.chars().count() as u16).min(area.width - 3);
        let row = (visible.len().saturating_sub(1) as u16).min(area.height - 3);
        frame.set_cursor_position(Position::new(area.x + 1 + column, area.y + 1 + row));
    }
}

/// Bottom-border hint; greyed out while sending is disabled.
fn send_hint(busy: bool) -> Line<'static> {
    let hint = if busy {
        Line::from(Span::styled(
            " waiting for reply ",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::styled(" Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" send "),
        ])
    };
    hint.right_aligned()
}
