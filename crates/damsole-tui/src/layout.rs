// Screen layout: host page, launcher and chat panel.
//
// The terminal stands in for the host page. The launcher sits in the
// bottom-right corner above the help bar, and the panel floats above the
// launcher, right-aligned with it:
//
// +--------------------------------------------------+
// | Host page                     +- Panel ---------+|
// |                               | Header (3 rows) ||
// |                               | Transcript      ||
// |                               | Composer (grows)||
// |                               +-----------------+|
// |                                      [ Launcher ]|
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Launcher badge size.
pub const LAUNCHER_WIDTH: u16 = 14;
pub const LAUNCHER_HEIGHT: u16 = 3;

/// Preferred panel size; clamped to the screen.
pub const PANEL_WIDTH: u16 = 56;
pub const PANEL_HEIGHT: u16 = 28;

/// Header rows inside the panel: title line plus status line, with borders.
const HEADER_HEIGHT: u16 = 4;

/// Resolved screen areas for the host page.
#[derive(Debug, Clone)]
pub struct HostLayout {
    /// Everything above the help bar.
    pub page: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
    pub launcher: Rect,
    /// Overlay area used while the panel is open.
    pub panel: Rect,
}

/// Resolved areas inside the open panel.
#[derive(Debug, Clone)]
pub struct PanelLayout {
    pub header: Rect,
    pub transcript: Rect,
    pub composer: Rect,
}

/// Build the host layout from the available terminal area.
pub fn build_layout(area: Rect) -> HostLayout {
    // Vertical: page(fill) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let page = vertical[0];
    let help_bar = vertical[1];

    let launcher = corner_rect(LAUNCHER_WIDTH, LAUNCHER_HEIGHT, page);

    // The panel uses the space above the launcher.
    let above_launcher = Rect {
        height: launcher.y.saturating_sub(page.y),
        ..page
    };
    let panel = corner_rect(PANEL_WIDTH, PANEL_HEIGHT, above_launcher);

    HostLayout {
        page,
        help_bar,
        launcher,
        panel,
    }
}

/// Split the panel into header, transcript and composer.
///
/// `composer_height` includes the composer's borders. The transcript keeps
/// at least one row when the panel is tall enough.
pub fn build_panel_layout(panel: Rect, composer_height: u16) -> PanelLayout {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(composer_height),
        ])
        .split(panel);

    PanelLayout {
        header: sections[0],
        transcript: sections[1],
        composer: sections[2],
    }
}

/// A rectangle of the given size anchored to the bottom-right corner of
/// `area`, clamped to the available space.
pub fn corner_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + area.width - width,
        y: area.y + area.height - height,
        width,
        height,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 120, 40)
    }

    #[test]
    fn help_bar_is_last_row() {
        let layout = build_layout(test_area());
        assert_eq!(layout.help_bar.height, 1);
        assert_eq!(layout.help_bar.y, 39);
        assert_eq!(layout.page.height, 39);
    }

    #[test]
    fn launcher_sits_in_bottom_right_of_page() {
        let layout = build_layout(test_area());
        assert_eq!(layout.launcher.width, LAUNCHER_WIDTH);
        assert_eq!(layout.launcher.height, LAUNCHER_HEIGHT);
        assert_eq!(layout.launcher.right(), layout.page.right());
        assert_eq!(layout.launcher.bottom(), layout.page.bottom());
    }

    #[test]
    fn panel_is_anchored_above_launcher() {
        let layout = build_layout(test_area());
        assert_eq!(layout.panel.width, PANEL_WIDTH);
        assert_eq!(layout.panel.height, PANEL_HEIGHT);
        assert_eq!(layout.panel.bottom(), layout.launcher.y);
        assert_eq!(layout.panel.right(), layout.launcher.right());
    }

    #[test]
    fn panel_clamps_on_small_screen() {
        let area = Rect::new(0, 0, 30, 12);
        let layout = build_layout(area);
        assert!(layout.panel.width <= 30);
        assert!(layout.panel.bottom() <= layout.launcher.y);
        assert!(layout.panel.height <= 12 - 1 - LAUNCHER_HEIGHT);
    }

    #[test]
    fn corner_rect_handles_zero_area() {
        let r = corner_rect(10, 5, Rect::new(3, 4, 0, 0));
        assert_eq!(r, Rect::new(3, 4, 0, 0));
    }

    #[test]
    fn panel_sections_fill_panel() {
        let panel = Rect::new(10, 2, PANEL_WIDTH, PANEL_HEIGHT);
        let sections = build_panel_layout(panel, 5);
        assert_eq!(sections.header.height, HEADER_HEIGHT);
        assert_eq!(sections.composer.height, 5);
        assert_eq!(
            sections.header.height + sections.transcript.height + sections.composer.height,
            PANEL_HEIGHT
        );
        assert_eq!(sections.composer.bottom(), panel.bottom());
    }
}
