// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// conversation loop, or into local ViewState mutations (composer editing,
// chip focus).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use damsole_core::protocol::UserCommand;

use super::{Focus, ViewState};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// conversation loop. Returns `None` when the key press was handled locally
/// or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.panel_open {
        handle_panel_key(key_event, view_state)
    } else {
        handle_launcher_key(key_event, view_state)
    }
}

/// Keys while only the launcher is showing.
fn handle_launcher_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('c') | KeyCode::Enter => {
            // Open right away so typing works before the controller confirms.
            view_state.panel_open = true;
            Some(UserCommand::OpenPanel)
        }
        KeyCode::Char('q') => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Keys while the chat panel is open.
fn handle_panel_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.panel_open = false;
            view_state.focus = Focus::Composer;
            Some(UserCommand::ClosePanel)
        }

        KeyCode::Tab => {
            focus_next_chip(view_state);
            None
        }
        KeyCode::BackTab => {
            focus_prev_chip(view_state);
            None
        }

        KeyCode::Enter if key_event.modifiers.contains(KeyModifiers::ALT) => {
            view_state.focus = Focus::Composer;
            view_state.composer.push('\n');
            None
        }
        KeyCode::Enter => match view_state.focus {
            Focus::Chip(index) => pick_focused_chip(view_state, index),
            Focus::Composer => submit_composer(view_state),
        },

        KeyCode::Backspace => {
            view_state.focus = Focus::Composer;
            view_state.composer.pop();
            None
        }
        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            view_state.focus = Focus::Composer;
            view_state.composer.push(c);
            None
        }

        _ => None,
    }
}

/// Enter on the composer: hand the text to the controller.
///
/// The text stays in the composer until the controller echoes it back, so a
/// send turned away by a request in flight can be retried. Nothing is sent
/// while busy, while an earlier send awaits its echo, or for blank text.
fn submit_composer(view_state: &mut ViewState) -> Option<UserCommand> {
    if view_state.busy
        || view_state.pending_send.is_some()
        || view_state.composer.trim().is_empty()
    {
        return None;
    }
    let text = view_state.composer.clone();
    view_state.pending_send = Some(text.clone());
    Some(UserCommand::Send(text))
}

/// Enter on a focused chip. Chips stay put while a request is in flight.
fn pick_focused_chip(view_state: &mut ViewState, index: usize) -> Option<UserCommand> {
    if view_state.busy {
        return None;
    }
    let suggestion = view_state.suggestions.get(index)?.clone();
    view_state.focus = Focus::Composer;
    Some(UserCommand::PickSuggestion(suggestion))
}

/// Tab: composer -> first chip -> ... -> last chip -> composer.
fn focus_next_chip(view_state: &mut ViewState) {
    let count = view_state.focusable_chips();
    if count == 0 {
        view_state.focus = Focus::Composer;
        return;
    }
    view_state.focus = match view_state.focus {
        Focus::Composer => Focus::Chip(0),
        Focus::Chip(i) if i + 1 < count => Focus::Chip(i + 1),
        Focus::Chip(_) => Focus::Composer,
    };
}

/// Shift+Tab: the reverse of `focus_next_chip`.
fn focus_prev_chip(view_state: &mut ViewState) {
    let count = view_state.focusable_chips();
    if count == 0 {
        view_state.focus = Focus::Composer;
        return;
    }
    view_state.focus = match view_state.focus {
        Focus::Composer => Focus::Chip(count - 1),
        Focus::Chip(0) => Focus::Composer,
        Focus::Chip(i) => Focus::Chip(i - 1),
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
