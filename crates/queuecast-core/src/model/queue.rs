// ── Queue and entry domain types ──
//
// Read-only copies of what the backend reported on one poll. The core
// never mutates these; it only compares successive snapshots.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a queue entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryStatus {
    Waiting,
    InProgress,
    Served,
    /// A status string this build does not recognise.
    Unknown,
}

impl EntryStatus {
    /// Parse the backend's status string, mapping anything unrecognised to
    /// [`Unknown`](Self::Unknown).
    pub fn from_wire(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }
}

/// One customer in a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    /// Phone-number-like identifier used to address notifications.
    pub recipient: String,
    pub full_name: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
    pub left: bool,
    pub status: EntryStatus,
    /// Set once the entry reaches `in_progress`.
    pub started_at: Option<DateTime<Utc>>,
    /// Set once the entry reaches `served`.
    pub served_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Still in the queue: not left and not yet served.
    pub fn is_active(&self) -> bool {
        !self.left && self.status != EntryStatus::Served
    }

    /// Strictly waiting: not left, not served and not being served.
    pub fn is_waiting(&self) -> bool {
        !self.left && self.status == EntryStatus::Waiting
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == EntryStatus::InProgress
    }

    /// Time between service start and completion, if both are known and
    /// the difference is positive.
    pub fn service_duration(&self) -> Option<Duration> {
        let (started, served) = (self.started_at?, self.served_at?);
        (served - started).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// A service queue with its entries in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub queue_id: String,
    pub name: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub entries: Vec<Entry>,
}

impl Queue {
    /// Entries that are neither left nor served.
    pub fn active_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_active())
    }

    /// Strictly waiting entries, in arrival order.
    pub fn waiting_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_waiting())
    }

    /// All entries addressed to `recipient`, in arrival order.
    pub fn entries_for<'a>(&'a self, recipient: &'a str) -> impl Iterator<Item = &'a Entry> {
        self.entries.iter().filter(move |e| e.recipient == recipient)
    }
}
