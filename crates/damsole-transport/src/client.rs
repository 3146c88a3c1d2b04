// HTTP client for the backend `/chat` endpoint.
//
// Posts `{"message": ...}` as JSON and normalizes the reply field. Every
// failure (transport, non-2xx status, undecodable body) comes back as a
// `TransportError`; callers decide whether it is shown or swallowed.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use damsole_core::config::{Credentials, WidgetConfig};
use damsole_core::protocol::{ChatRequest, Reply};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_REDIRECTS: usize = 10;

const FALLBACK_PREFIX: &str = "Sorry, I am not able to respond right now.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    #[error("network error: {message}")]
    Network { message: String },

    /// The endpoint answered with a non-2xx status.
    #[error("chat request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("invalid JSON in chat response: {message}")]
    Parse { message: String },
}

/// User-visible bot message for a failed exchange with `endpoint`.
pub fn fallback_text(err: &TransportError, endpoint: &Url) -> String {
    match err {
        TransportError::Network { .. } => format!(
            "{FALLBACK_PREFIX} Please make sure the chat server is reachable at {endpoint}."
        ),
        TransportError::Http { .. } | TransportError::Parse { .. } => {
            format!("{FALLBACK_PREFIX} Please try again shortly.")
        }
    }
}

// ---------------------------------------------------------------------------
// ChatTransport
// ---------------------------------------------------------------------------

/// A single request/response exchange with the chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<Reply, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// reqwest-backed transport. Holds one client so the cookie store persists
/// across requests.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Build a transport for `endpoint` with the given cookie policy.
    pub fn new(endpoint: Url, credentials: Credentials) -> reqwest::Result<Self> {
        let builder = reqwest::Client::builder();
        let builder = match credentials {
            Credentials::Omit => builder,
            Credentials::SameOrigin => {
                let origin = endpoint.origin();
                builder
                    .cookie_store(true)
                    .redirect(Policy::custom(move |attempt| {
                        if attempt.previous().len() >= MAX_REDIRECTS {
                            attempt.error("too many redirects")
                        } else if attempt.url().origin() == origin {
                            attempt.follow()
                        } else {
                            attempt.stop()
                        }
                    }))
            }
            Credentials::Include => builder.cookie_store(true),
        };

        Ok(Self {
            http: builder.build()?,
            endpoint,
        })
    }

    pub fn from_config(config: &WidgetConfig) -> reqwest::Result<Self> {
        Self::new(config.endpoint.clone(), config.credentials)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, message: &str) -> Result<Reply, TransportError> {
        info!(endpoint = %self.endpoint, chars = message.len(), "sending chat message");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "chat request failed");
                TransportError::Network {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        debug!(%status, "chat response status");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "chat server returned an error");
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| TransportError::Network {
            message: e.to_string(),
        })?;
        let reply = parse_reply(&body)?;
        debug!(chars = reply.text.len(), suggestions = ?reply.show_suggestions, "chat reply");
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Decode a 2xx response body into a `Reply`.
pub(crate) fn parse_reply(body: &str) -> Result<Reply, TransportError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "chat response is not JSON");
        TransportError::Parse {
            message: e.to_string(),
        }
    })?;
    Reply::from_body(&value).map_err(|e| {
        warn!(error = %e, "chat response has an unexpected shape");
        TransportError::Parse {
            message: e.to_string(),
        }
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
