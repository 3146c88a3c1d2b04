// Transcript widget: the chat messages, live suggestion chips and the typing
// indicator. Always scrolled to the newest line.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use damsole_core::protocol::{Message, Sender};

use super::{section_border_style, ACCENT};
use crate::{Focus, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = build_lines(state);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height as usize;
    let total = wrapped_height(&lines, inner_width);
    let scroll = u16::try_from(total.saturating_sub(inner_height)).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT)
                .border_style(section_border_style(state.busy)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Build every transcript line, oldest first.
pub fn build_lines(state: &ViewState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    // Only the newest set of chips takes keyboard focus.
    let focus_target = state.live_chips.last().copied();

    for (index, message) in state.messages.iter().enumerate() {
        push_message(&mut lines, message);

        if state.live_chips.contains(&index) {
            let focused = match state.focus {
                Focus::Chip(chip) if focus_target == Some(index) => Some(chip),
                _ => None,
            };
            push_chips(&mut lines, &state.suggestions, focused);
        }
        lines.push(Line::default());
    }

    if state.busy {
        lines.push(Line::from(Span::styled(
            "Assistant is typing...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_message(lines: &mut Vec<Line<'static>>, message: &Message) {
    let (label, alignment, text_style) = match message.sender {
        Sender::User => ("You", Alignment::Right, Style::default().fg(Color::White)),
        Sender::Bot => ("Assistant", Alignment::Left, Style::default().fg(Color::Gray)),
    };

    lines.push(
        Line::from(vec![
            Span::styled(label, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" {}", message.sent_at.format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ])
        .alignment(alignment),
    );

    for text_line in message.text.lines() {
        lines.push(Line::styled(text_line.to_string(), text_style).alignment(alignment));
    }
}

fn push_chips(lines: &mut Vec<Line<'static>>, suggestions: &[String], focused: Option<usize>) {
    for (i, suggestion) in suggestions.iter().enumerate() {
        let style = if focused == Some(i) {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(ACCENT)
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[ {suggestion} ]"), style),
        ]));
    }
}

/// Rows the lines occupy once word-wrapped to `width` columns, using the same
/// wrapper the paragraph renders with.
fn wrapped_height(lines: &[Line<'static>], width: u16) -> usize {
    if width == 0 {
        return lines.len();
    }
    Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
