// ── Rate-limit ledger ──
//
// Last send time per (recipient, queue, channel). Entries older than the
// window carry no information and are pruned after every dispatch call.
// Every recorded send is also kept in a separate history for
// `HISTORY_WINDOW`, which backs the send-volume statistics.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::model::{AlertRequest, Channel};

/// Identity an alert is rate-limited under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub recipient: String,
    pub queue_id: String,
    pub channel: Channel,
}

impl From<&AlertRequest> for LedgerKey {
    fn from(req: &AlertRequest) -> Self {
        Self {
            recipient: req.recipient.clone(),
            queue_id: req.queue_id.clone(),
            channel: req.channel,
        }
    }
}

/// How far back send history is kept.
pub const HISTORY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    sent: DashMap<LedgerKey, DateTime<Utc>>,
    history: Mutex<VecDeque<DateTime<Utc>>>,
}

impl Ledger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn last_sent(&self, key: &LedgerKey) -> Option<DateTime<Utc>> {
        self.sent.get(key).map(|ts| *ts)
    }

    pub(crate) fn record(&self, key: LedgerKey, at: DateTime<Utc>) {
        self.sent.insert(key, at);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(at);
    }

    /// Whether `key` was sent within `window` of `now`.
    pub(crate) fn is_limited(&self, key: &LedgerKey, now: DateTime<Utc>, window: Duration) -> bool {
        let Some(last) = self.last_sent(key) else {
            return false;
        };
        match chrono::Duration::from_std(window) {
            Ok(window) => now - last < window,
            // A window too large to represent never elapses.
            Err(_) => true,
        }
    }

    /// Drop every key older than `now - window`, and history older than
    /// `now - HISTORY_WINDOW`.
    pub(crate) fn prune(&self, now: DateTime<Utc>, window: Duration) {
        if let Some(cutoff) = cutoff(now, window) {
            self.sent.retain(|_, ts| *ts >= cutoff);
        }
        if let Some(cutoff) = cutoff(now, HISTORY_WINDOW) {
            self.history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|ts| *ts >= cutoff);
        }
    }

    /// Number of sends recorded at or after `since`. History reaches back
    /// `HISTORY_WINDOW` at most.
    pub(crate) fn count_since(&self, since: DateTime<Utc>) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|ts| **ts >= since)
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.sent.len()
    }
}

fn cutoff(now: DateTime<Utc>, window: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(recipient: &str, channel: Channel) -> LedgerKey {
        LedgerKey {
            recipient: recipient.into(),
            queue_id: "q-1".into(),
            channel,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    const WINDOW: Duration = Duration::from_secs(300);

    #[test]
    fn limited_strictly_inside_window() {
        let ledger = Ledger::new();
        let k = key("a", Channel::WhatsApp);
        ledger.record(k.clone(), t0());

        assert!(ledger.is_limited(&k, t0() + chrono::Duration::seconds(299), WINDOW));
        assert!(!ledger.is_limited(&k, t0() + chrono::Duration::seconds(300), WINDOW));
        assert!(!ledger.is_limited(&key("b", Channel::WhatsApp), t0(), WINDOW));
    }

    #[test]
    fn channels_are_limited_independently() {
        let ledger = Ledger::new();
        ledger.record(key("a", Channel::WhatsApp), t0());
        assert!(!ledger.is_limited(&key("a", Channel::Ussd), t0(), WINDOW));
    }

    #[test]
    fn prune_drops_only_expired_entries() {
        let ledger = Ledger::new();
        ledger.record(key("old", Channel::WhatsApp), t0());
        ledger.record(key("new", Channel::WhatsApp), t0() + chrono::Duration::minutes(4));

        ledger.prune(t0() + chrono::Duration::minutes(6), WINDOW);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_sent(&key("new", Channel::WhatsApp)).is_some());
    }

    #[test]
    fn history_outlives_the_rate_limit_window() {
        let ledger = Ledger::new();
        let k = key("a", Channel::WhatsApp);
        ledger.record(k.clone(), t0());
        ledger.record(k, t0() + chrono::Duration::minutes(10));

        ledger.prune(t0() + chrono::Duration::minutes(20), WINDOW);
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.count_since(t0()), 2);

        ledger.prune(t0() + chrono::Duration::hours(24) + chrono::Duration::minutes(5), WINDOW);
        assert_eq!(ledger.count_since(t0()), 1);
    }
}
