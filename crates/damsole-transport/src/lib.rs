// Transport adapter: one request/response exchange with the backend chat
// endpoint per call.

pub mod client;

pub use client::{fallback_text, ChatTransport, HttpTransport, TransportError};
