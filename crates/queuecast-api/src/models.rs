// Wire types for the backend snapshot endpoint and the messaging API.
//
// Backend fields are decoded leniently: a missing key or a JSON `null`
// yields the field's default, and timestamps stay as raw strings here. Parsing them into
// real instants (and tolerating garbage) is the core crate's job.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Backend snapshot ─────────────────────────────────────────────────

/// Response of `GET /queues/all/`.
///
/// ```json
/// { "queues": [ { "queue_id": "...", "entries": [ ... ] } ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueuesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub queues: Vec<RawQueue>,
}

/// One queue as the backend reports it. Entries are in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQueue {
    pub queue_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// RFC 3339 timestamp, possibly empty or null.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entries: Vec<RawEntry>,
}

/// One customer entry inside a queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    pub id: String,
    pub msisdn: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub left: bool,
    /// "waiting", "in_progress" or "served".
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub served_at: Option<String>,
}

// ── Messaging API ────────────────────────────────────────────────────

/// Text message payload for the WhatsApp Cloud API `messages` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextMessage {
    pub messaging_product: String,
    pub recipient_type: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBody {
    pub preview_url: bool,
    pub body: String,
}

impl TextMessage {
    /// Build an individual text message addressed to `to`.
    pub fn new(to: impl Into<String>, body: impl Into<String>, preview_url: bool) -> Self {
        Self {
            messaging_product: "whatsapp".into(),
            recipient_type: "individual".into(),
            to: to.into(),
            kind: "text".into(),
            text: TextBody {
                preview_url,
                body: body.into(),
            },
        }
    }
}
