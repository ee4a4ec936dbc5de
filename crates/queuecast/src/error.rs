//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use queuecast_config::ConfigError;
use queuecast_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const DELIVERY: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the queue backend at {url}")]
    #[diagnostic(
        code(queuecast::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             URL: {url}\n\
             Override with: queuecast --base-url <URL> check"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(queuecast::timeout),
        help("Raise backend.timeout_secs or alerts.send_timeout_secs, or check the remote side.")
    )]
    Timeout,

    #[error("Backend error: {message}")]
    #[diagnostic(code(queuecast::backend))]
    Backend { message: String },

    // ── Delivery ─────────────────────────────────────────────────────
    #[error("No sink is registered for channel '{channel}'")]
    #[diagnostic(
        code(queuecast::no_sink),
        help(
            "WhatsApp needs whatsapp.phone_number_id and an access token\n\
             (env var WHATSAPP_ACCESS_TOKEN, the system keyring, or whatsapp.access_token)."
        )
    )]
    NoSink { channel: String },

    #[error("Delivery failed: {message}")]
    #[diagnostic(code(queuecast::delivery), help("Run with -v for the sink's error details."))]
    Delivery { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(queuecast::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(queuecast::config),
        help("See `queuecast config path` for the file location and `queuecast config show` for effective values.")
    )]
    Config(#[from] ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Backend { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NoSink { .. } | Self::Delivery { .. } => exit_code::DELIVERY,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(_) => exit_code::CONFIG,
            Self::Io(_) | Self::Internal(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::Backend { message, status: _ } => Self::Backend { message },
            CoreError::MalformedSnapshot { message } => Self::Backend {
                message: format!("malformed snapshot: {message}"),
            },
            CoreError::Delivery { channel, message } => Self::Delivery {
                message: format!("{channel}: {message}"),
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_distinct_exit_codes() {
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(CoreError::ConnectionFailed {
                url: "http://127.0.0.1:9".into(),
                reason: "refused".into(),
            })
            .exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::from(CoreError::Config {
                message: "bad".into()
            })
            .exit_code(),
            exit_code::USAGE
        );
    }
}
