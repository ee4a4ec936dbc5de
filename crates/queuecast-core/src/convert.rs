// ── Wire → domain conversion ──
//
// Turns the backend's raw JSON types into domain types. Timestamps are
// parsed field by field: an empty, null or unparseable value becomes `None`
// instead of failing the whole snapshot.

use chrono::{DateTime, Utc};
use tracing::warn;

use queuecast_api::{QueuesResponse, RawEntry, RawQueue};

use crate::model::{Entry, EntryStatus, Queue};

/// Parse an optional RFC 3339 timestamp leniently.
pub fn parse_timestamp(field: &'static str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!(field, value = raw, error = %e, "ignoring unparseable timestamp");
            None
        }
    }
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        let status = EntryStatus::from_wire(&raw.status);
        if status == EntryStatus::Unknown {
            warn!(entry = %raw.id, status = %raw.status, "unrecognised entry status");
        }

        Entry {
            joined_at: parse_timestamp("joined_at", raw.joined_at.as_deref()),
            started_at: parse_timestamp("started_at", raw.started_at.as_deref()),
            served_at: parse_timestamp("served_at", raw.served_at.as_deref()),
            full_name: raw.full_name.filter(|n| !n.trim().is_empty()),
            id: raw.id,
            recipient: raw.msisdn,
            left: raw.left,
            status,
        }
    }
}

impl From<RawQueue> for Queue {
    fn from(raw: RawQueue) -> Self {
        Queue {
            created_at: parse_timestamp("created_at", raw.created_at.as_deref()),
            queue_id: raw.queue_id,
            name: raw.name,
            description: raw.description,
            entries: raw.entries.into_iter().map(Entry::from).collect(),
        }
    }
}

/// Convert a whole backend response into domain queues, preserving order.
pub fn queues_from_response(resp: QueuesResponse) -> Vec<Queue> {
    resp.queues.into_iter().map(Queue::from).collect()
}
