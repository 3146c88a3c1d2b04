// Append-only transcript with a separate record of which messages still show
// their suggestion chips.

use std::collections::BTreeSet;

use crate::protocol::{Message, Sender};

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Indices of bot messages whose chips are currently displayed.
    live_chips: BTreeSet<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index. Bot messages flagged with
    /// `show_suggestions` get live chips.
    pub fn push(&mut self, message: Message) -> usize {
        let index = self.messages.len();
        if message.sender == Sender::Bot && message.show_suggestions {
            self.live_chips.insert(index);
        }
        self.messages.push(message);
        index
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn chips_live_at(&self, index: usize) -> bool {
        self.live_chips.contains(&index)
    }

    pub fn has_live_chips(&self) -> bool {
        !self.live_chips.is_empty()
    }

    /// Remove every live chip. Returns false when there were none.
    pub fn clear_chips(&mut self) -> bool {
        let had_chips = self.has_live_chips();
        self.live_chips.clear();
        had_chips
    }
}
