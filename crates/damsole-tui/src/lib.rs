// Terminal host for the chat widget: layout, input handling, and rendering.
//
// The TUI owns a `ViewState` that mirrors the conversation controller's
// transcript and flags. The conversation loop pushes `UiUpdate` messages over
// an mpsc channel; the TUI applies them to `ViewState` and re-renders at
// ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::BTreeSet;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Wrap};
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use damsole_core::config::WidgetConfig;
use damsole_core::protocol::{Message, Sender, UiUpdate, UserCommand};

use layout::{build_layout, build_panel_layout, HostLayout};
use widgets::composer::composer_height;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Which element of the open panel has keyboard focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Composer,
    /// Index into `ViewState::suggestions` of the newest live chip set.
    Chip(usize),
}

/// TUI-local state that mirrors the conversation for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the conversation loop.
/// The `render_frame` function reads this struct to draw the screen.
pub struct ViewState {
    /// Panel title from the widget config.
    pub title: String,
    /// Chip texts from the widget config.
    pub suggestions: Vec<String>,
    pub composer_max_lines: u16,
    /// Rendered transcript, oldest first.
    pub messages: Vec<Message>,
    /// Transcript positions whose chips are still showing.
    pub live_chips: BTreeSet<usize>,
    /// A request is in flight: typing indicator on, sending disabled.
    pub busy: bool,
    pub panel_open: bool,
    /// Unsent composer text.
    pub composer: String,
    /// Composer text handed to the controller and not yet echoed back.
    /// The composer keeps the text until the echo arrives.
    pub pending_send: Option<String>,
    pub focus: Focus,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::from_config(&WidgetConfig::default())
    }
}

impl ViewState {
    pub fn from_config(config: &WidgetConfig) -> Self {
        ViewState {
            title: config.title.clone(),
            suggestions: config.suggestions.clone(),
            composer_max_lines: config.composer_max_lines,
            messages: Vec::new(),
            live_chips: BTreeSet::new(),
            busy: false,
            panel_open: false,
            composer: String::new(),
            pending_send: None,
            focus: Focus::Composer,
        }
    }

    /// Number of chips Tab can move through.
    pub fn focusable_chips(&self) -> usize {
        if self.live_chips.is_empty() {
            0
        } else {
            self.suggestions.len()
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::MessageAppended {
            index,
            message,
            chips,
        } => {
            if index != state.messages.len() {
                warn!(
                    index,
                    rendered = state.messages.len(),
                    "transcript index out of step with view"
                );
            }
            if chips {
                state.live_chips.insert(state.messages.len());
            }
            if message.sender == Sender::User {
                settle_pending_send(state, &message.text);
            }
            state.messages.push(message);
        }
        UiUpdate::SuggestionsCleared => {
            state.live_chips.clear();
            if matches!(state.focus, Focus::Chip(_)) {
                state.focus = Focus::Composer;
            }
        }
        UiUpdate::Busy(busy) => {
            // An accepted send is echoed before its Busy(true), so a send
            // still pending here was turned away by a request in flight.
            if busy && state.pending_send.take().is_some() {
                debug!("send not accepted, composer text kept");
            }
            state.busy = busy;
        }
        UiUpdate::PanelOpen(open) => {
            state.panel_open = open;
            if !open {
                state.focus = Focus::Composer;
            }
        }
    }
}

/// The controller echoed a user message: drop the sent text from the composer.
fn settle_pending_send(state: &mut ViewState, echoed: &str) {
    let Some(pending) = state.pending_send.as_deref() else {
        return;
    };
    if pending.trim() != echoed {
        return;
    }
    if let Some(rest) = state.composer.strip_prefix(pending) {
        state.composer = rest.to_string();
    }
    state.pending_send = None;
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the host page, the launcher and, when open, the chat panel.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    render_page(frame, &layout);
    render_help_bar(frame, &layout, state);
    widgets::launcher::render(frame, layout.launcher, state);

    if state.panel_open {
        render_panel(frame, &layout, state);
    }
}

fn render_page(frame: &mut Frame, layout: &HostLayout) {
    let text = vec![
        Line::from(Span::styled(
            "Damsole",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::styled(
            "Websites, logos, apps and marketing services.",
            Style::default().fg(Color::Gray),
        ),
    ];
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, layout.page);
}

fn render_panel(frame: &mut Frame, layout: &HostLayout, state: &ViewState) {
    // Clear the area behind the panel so it renders cleanly on top
    frame.render_widget(Clear, layout.panel);

    let composer = composer_height(&state.composer, state.composer_max_lines);
    let sections = build_panel_layout(layout.panel, composer);

    widgets::header::render(frame, sections.header, state);
    widgets::transcript::render(frame, sections.transcript, state);
    widgets::composer::render(frame, sections.composer, state);
}

fn render_help_bar(frame: &mut Frame, layout: &HostLayout, state: &ViewState) {
    let text = if state.panel_open {
        " Enter:Send | Alt+Enter:Newline | Tab:Suggestions | Esc:Close | Ctrl+C:Quit"
    } else {
        " c:Chat | q:Quit"
    };
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Best-effort terminal restoration
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // Channel closed: conversation loop is gone
                    None => break Ok(()),
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            debug!(?cmd, "forwarding user command");
                            if cmd_tx.send(cmd).await.is_err() || quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse, paste and resize events need no handling
                    }
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(e.into());
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
