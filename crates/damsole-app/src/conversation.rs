// Conversation controller.
//
// Owns the widget state, the transcript and the suggestion chips. Turns user
// intents (manual send, chip pick, first panel open) into at most one backend
// request at a time and renders the results in order.
//
// Requests run on spawned tasks. Each task owns a `SendPermit`; the reply is
// queued before the permit drops, so the reply always renders before the
// sending gate reopens, whatever way the task ends.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use damsole_core::config::WidgetConfig;
use damsole_core::protocol::{Message, Reply, UiUpdate};
use damsole_core::transcript::Transcript;
use damsole_transport::{fallback_text, ChatTransport, TransportError};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetState {
    /// A backend request is in flight. New sends are rejected.
    pub is_sending: bool,
    /// The silent auto-start probe has been issued. Never goes back to false.
    pub has_auto_started: bool,
    pub is_panel_open: bool,
}

/// Why a request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Typed message or picked chip: echoed as a user message, failures shown.
    Manual,
    /// First-open probe: no user message, failures swallowed.
    AutoStart,
}

/// Result of asking the controller to send something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Dispatched,
    /// Another request is still in flight.
    Busy,
    /// Nothing left after trimming.
    Empty,
    /// The picked text is not a live suggestion chip.
    NoLiveChip,
}

/// Events sent back from in-flight request tasks.
#[derive(Debug)]
pub enum ConversationEvent {
    Reply {
        request_id: u64,
        kind: RequestKind,
        outcome: Result<Reply, TransportError>,
    },
    /// The request's permit was dropped.
    Settled { request_id: u64 },
}

/// Held by an in-flight request. Dropping it queues `Settled`.
#[derive(Debug)]
pub struct SendPermit {
    request_id: u64,
    events: mpsc::UnboundedSender<ConversationEvent>,
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        let _ = self.events.send(ConversationEvent::Settled {
            request_id: self.request_id,
        });
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

pub struct Conversation {
    config: WidgetConfig,
    transport: Arc<dyn ChatTransport>,
    state: WidgetState,
    transcript: Transcript,
    ui_tx: mpsc::Sender<UiUpdate>,
    events_tx: mpsc::UnboundedSender<ConversationEvent>,
    next_request_id: u64,
    in_flight: Option<u64>,
}

impl Conversation {
    /// Create a controller and the receiver its request tasks report to.
    /// The caller feeds every received event back through `handle_event`.
    pub fn new(
        config: WidgetConfig,
        transport: Arc<dyn ChatTransport>,
        ui_tx: mpsc::Sender<UiUpdate>,
    ) -> (Self, mpsc::UnboundedReceiver<ConversationEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let conversation = Conversation {
            config,
            transport,
            state: WidgetState::default(),
            transcript: Transcript::new(),
            ui_tx,
            events_tx,
            next_request_id: 0,
            in_flight: None,
        };
        (conversation, events_rx)
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Render the configured greeting. Never carries chips.
    pub async fn greet(&mut self) {
        let greeting = self.config.initial_message.clone();
        self.append(Message::bot(greeting, false)).await;
    }

    // -- Panel --

    pub async fn open(&mut self) {
        self.set_panel(true).await;
    }

    pub async fn close(&mut self) {
        self.set_panel(false).await;
    }

    pub async fn toggle(&mut self) {
        let open = !self.state.is_panel_open;
        self.set_panel(open).await;
    }

    async fn set_panel(&mut self, open: bool) {
        if self.state.is_panel_open != open {
            self.state.is_panel_open = open;
            debug!(open, "panel visibility changed");
            let _ = self.ui_tx.send(UiUpdate::PanelOpen(open)).await;
        }
        if open {
            self.auto_start().await;
        }
    }

    /// Fire the silent probe the first time the panel opens.
    async fn auto_start(&mut self) {
        if self.state.has_auto_started {
            return;
        }
        self.state.has_auto_started = true;

        if self.state.is_sending {
            info!("request already in flight at first open, skipping auto-start");
            return;
        }
        let payload = self.config.auto_start_payload.clone();
        self.dispatch(payload, RequestKind::AutoStart).await;
    }

    // -- Sending --

    /// Send a typed message. No-op while a request is in flight or when the
    /// text is blank.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        if self.state.is_sending {
            debug!("send rejected: request in flight");
            return SendOutcome::Busy;
        }
        let message = text.trim();
        if message.is_empty() {
            return SendOutcome::Empty;
        }
        self.dispatch(message.to_string(), RequestKind::Manual).await
    }

    /// Pick a suggestion chip: clear every live chip, then send its text.
    pub async fn pick_suggestion(&mut self, suggestion: &str) -> SendOutcome {
        if self.state.is_sending {
            debug!("suggestion rejected: request in flight");
            return SendOutcome::Busy;
        }
        let offered = self.config.suggestions.iter().any(|s| s == suggestion);
        if !offered || !self.transcript.has_live_chips() {
            debug!(suggestion, "no live chip with this text");
            return SendOutcome::NoLiveChip;
        }

        self.transcript.clear_chips();
        let _ = self.ui_tx.send(UiUpdate::SuggestionsCleared).await;

        self.dispatch(suggestion.to_string(), RequestKind::Manual).await
    }

    async fn dispatch(&mut self, message: String, kind: RequestKind) -> SendOutcome {
        if kind == RequestKind::Manual {
            self.append(Message::user(message.clone())).await;
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.in_flight = Some(request_id);
        self.state.is_sending = true;
        let _ = self.ui_tx.send(UiUpdate::Busy(true)).await;

        let permit = SendPermit {
            request_id,
            events: self.events_tx.clone(),
        };
        let transport = Arc::clone(&self.transport);
        let events = self.events_tx.clone();

        debug!(request_id, ?kind, "dispatching chat request");
        tokio::spawn(async move {
            let _permit = permit;
            let outcome = transport.send(&message).await;
            let _ = events.send(ConversationEvent::Reply {
                request_id,
                kind,
                outcome,
            });
        });

        SendOutcome::Dispatched
    }

    // -- Settlement --

    /// Apply an event reported by a request task.
    pub async fn handle_event(&mut self, event: ConversationEvent) {
        match event {
            ConversationEvent::Reply {
                request_id,
                kind,
                outcome,
            } => {
                if self.in_flight != Some(request_id) {
                    debug!(request_id, "discarding reply for a request that is not in flight");
                    return;
                }
                self.render_outcome(kind, outcome).await;
            }
            ConversationEvent::Settled { request_id } => {
                if self.in_flight != Some(request_id) {
                    return;
                }
                self.in_flight = None;
                self.state.is_sending = false;
                let _ = self.ui_tx.send(UiUpdate::Busy(false)).await;
            }
        }
    }

    async fn render_outcome(&mut self, kind: RequestKind, outcome: Result<Reply, TransportError>) {
        match outcome {
            Ok(reply) if reply.is_blank() => {
                // Expected for the auto-start probe; the greeting already shows.
                debug!(?kind, "blank reply, nothing to render");
            }
            Ok(reply) => {
                let chips = self.wants_suggestions(&reply);
                self.append(Message::bot(reply.text, chips)).await;
            }
            Err(err) => match kind {
                RequestKind::AutoStart => {
                    warn!(error = %err, "auto-start request failed");
                }
                RequestKind::Manual => {
                    warn!(error = %err, endpoint = %self.config.endpoint, "chat request failed");
                    let text = fallback_text(&err, &self.config.endpoint);
                    self.append(Message::bot(text, false)).await;
                }
            },
        }
    }

    /// An explicit `showSuggestions` flag decides. Without one, the reply
    /// gets chips when it contains the configured trigger phrase.
    fn wants_suggestions(&self, reply: &Reply) -> bool {
        if self.config.suggestions.is_empty() {
            return false;
        }
        match reply.show_suggestions {
            Some(flag) => flag,
            None => self.config.suggestion_trigger.as_deref().is_some_and(|trigger| {
                reply.text.to_lowercase().contains(&trigger.to_lowercase())
            }),
        }
    }

    async fn append(&mut self, message: Message) {
        let index = self.transcript.push(message.clone());
        let chips = self.transcript.chips_live_at(index);
        let _ = self
            .ui_tx
            .send(UiUpdate::MessageAppended {
                index,
                message,
                chips,
            })
            .await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
