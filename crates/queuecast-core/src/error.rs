// ── Core error types ──
//
// Errors surfaced by queuecast-core. Consumers never see reqwest errors or
// raw JSON failures directly: the `From<queuecast_api::Error>` impl
// translates transport-layer errors into these variants.
//
// Nothing here is fatal to the poll loop. Fetch errors skip a cycle and
// sink errors abort a single delivery.

use thiserror::Error;

use crate::model::Channel;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Backend errors ───────────────────────────────────────────────
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Malformed snapshot: {message}")]
    MalformedSnapshot { message: String },

    // ── Delivery errors ──────────────────────────────────────────────
    #[error("Delivery over {channel} failed: {message}")]
    Delivery { channel: Channel, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Attach a channel to an API error raised while delivering.
    pub fn delivery(channel: Channel, err: &impl std::fmt::Display) -> Self {
        Self::Delivery {
            channel,
            message: err.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<queuecast_api::Error> for CoreError {
    fn from(err: queuecast_api::Error) -> Self {
        match err {
            queuecast_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Backend {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            queuecast_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            queuecast_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            queuecast_api::Error::InvalidToken(msg) => CoreError::Config {
                message: format!("Invalid access token: {msg}"),
            },
            queuecast_api::Error::Status { status, body } => CoreError::Backend {
                message: format!("HTTP {status}: {body}"),
                status: Some(status),
            },
            queuecast_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedSnapshot { message }
            }
        }
    }
}
