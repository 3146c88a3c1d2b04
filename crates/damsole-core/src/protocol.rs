// Message types shared between the transport, the conversation controller and
// the terminal front end, plus the backend's JSON wire contract.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Transcript messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One rendered chat message. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    /// Whether suggestion chips were offered under this message.
    pub show_suggestions: bool,
    pub sent_at: DateTime<Local>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message {
            text: text.into(),
            sender: Sender::User,
            show_suggestions: false,
            sent_at: Local::now(),
        }
    }

    pub fn bot(text: impl Into<String>, show_suggestions: bool) -> Self {
        Message {
            text: text.into(),
            sender: Sender::Bot,
            show_suggestions,
            sent_at: Local::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend wire contract
// ---------------------------------------------------------------------------

/// Request body for `POST <endpoint>`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Response fields that may carry the reply text, highest priority first.
pub const REPLY_FIELDS: [&str; 3] = ["reply", "response", "message"];

/// Explicit response flag requesting suggestion chips.
pub const SHOW_SUGGESTIONS_FIELD: &str = "showSuggestions";

/// Normalized backend reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    /// `Some` only when the backend sent an explicit boolean flag.
    pub show_suggestions: Option<bool>,
}

/// A decoded response body that cannot be read as a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyShapeError {
    #[error("response body is not a JSON object")]
    NotAnObject,
    #[error("reply field `{field}` holds a non-string value")]
    NonStringField { field: &'static str },
}

impl Reply {
    /// Empty and whitespace-only replies render nothing.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Pull the reply text out of a decoded response body.
    ///
    /// Walks `REPLY_FIELDS` in order and stops at the first field holding a
    /// meaningful value. Missing, `null`, `false`, `0` and empty-string
    /// fields are skipped; a meaningful value that is not a string is an
    /// error, as is a body that is not an object. An object with none of
    /// the fields yields a blank reply.
    pub fn from_body(body: &Value) -> Result<Self, ReplyShapeError> {
        let fields = body.as_object().ok_or(ReplyShapeError::NotAnObject)?;

        let mut text = String::new();
        for field in REPLY_FIELDS {
            match fields.get(field) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(Value::Number(n)) if n.as_f64() == Some(0.0) => continue,
                Some(Value::String(s)) => {
                    text = s.clone();
                    break;
                }
                Some(_) => return Err(ReplyShapeError::NonStringField { field }),
            }
        }

        let show_suggestions = fields.get(SHOW_SUGGESTIONS_FIELD).and_then(Value::as_bool);

        Ok(Reply {
            text,
            show_suggestions,
        })
    }
}

// ---------------------------------------------------------------------------
// Controller <-> UI channel messages
// ---------------------------------------------------------------------------

/// State changes pushed from the conversation controller to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// A message was appended at `index`. `chips` is true when its suggestion
    /// chips are live.
    MessageAppended {
        index: usize,
        message: Message,
        chips: bool,
    },
    /// Every live suggestion chip was removed.
    SuggestionsCleared,
    /// A request started (`true`) or settled (`false`). Drives both the typing
    /// indicator and the disabled send affordance.
    Busy(bool),
    PanelOpen(bool),
}

/// Intents sent from the front end to the conversation controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    TogglePanel,
    OpenPanel,
    ClosePanel,
    Send(String),
    PickSuggestion(String),
    Quit,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
