// ── Alert types ──
//
// What gets sent, to whom, and over which channel.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Outbound notification channel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Channel {
    /// Messaging API (WhatsApp Cloud API).
    WhatsApp,
    /// USSD gateway push.
    Ussd,
    /// Realtime push to connected web clients.
    WebSocket,
}

/// One notification decision, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRequest {
    pub recipient: String,
    pub message: String,
    pub channel: Channel,
    pub queue_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Typed notification content. Rendered to text via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertMessage {
    /// The customer's service has just started.
    NowServing,
    /// First in line.
    Next,
    /// Second in line.
    AlmostUp { minutes: u64 },
    /// Third or later.
    Position {
        position: usize,
        queue_name: String,
        minutes: u64,
    },
}

impl AlertMessage {
    /// Positional update for a waiting customer. `None` when the customer is
    /// not in the waiting subset (position 0).
    pub fn for_position(position: usize, queue_name: &str, wait: Duration) -> Option<Self> {
        let minutes = wait.as_secs() / 60;
        match position {
            0 => None,
            1 => Some(Self::Next),
            2 => Some(Self::AlmostUp { minutes }),
            _ => Some(Self::Position {
                position,
                queue_name: queue_name.to_owned(),
                minutes,
            }),
        }
    }
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NowServing => {
                write!(f, "🔔 You're now being served! Please proceed to the counter.")
            }
            Self::Next => write!(
                f,
                "⏰ You're NEXT! Please be ready. Estimated wait: 0-2 minutes"
            ),
            Self::AlmostUp { minutes } => write!(
                f,
                "📍 Position #2 - You're almost up! Estimated wait: {minutes} minutes"
            ),
            Self::Position {
                position,
                queue_name,
                minutes,
            } => write!(
                f,
                "📋 Position #{position} in {queue_name}. Estimated wait: {minutes} minutes"
            ),
        }
    }
}
