// TUI widget modules for the launcher and each part of the chat panel.

pub mod composer;
pub mod header;
pub mod launcher;
pub mod transcript;

use ratatui::style::{Color, Style};

/// Accent color shared by the launcher, header and chips.
pub const ACCENT: Color = Color::Cyan;

/// Border style for a panel section, dimmed while a request is in flight.
pub fn section_border_style(busy: bool) -> Style {
    if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(ACCENT)
    }
}
