// Shared types for the chat widget: configuration, the backend wire contract,
// UI/command messages, and the append-only transcript.

pub mod config;
pub mod protocol;
pub mod transcript;
