// ── Transition detection ──
//
// Keeps the previous poll's copy of every queue and answers "was this
// customer already being served last cycle?". That lets the poller fire
// "now serving" on the rising edge of `in_progress` only.

use std::collections::HashMap;

use tracing::debug;

use crate::model::Queue;

/// Whether `recipient` was `in_progress` in `previous`.
///
/// False when there is no previous copy of the queue (first poll, new queue)
/// or the recipient was absent from it.
pub fn was_in_progress(previous: Option<&Queue>, recipient: &str) -> bool {
    previous.is_some_and(|q| q.entries_for(recipient).any(|e| e.is_in_progress()))
}

struct Retained {
    queue: Queue,
    /// Consecutive successful fetches that did not include this queue.
    missed: u32,
}

/// Last-seen snapshot per queue identity.
///
/// Owned by the poll loop; never shared across tasks. A queue that drops out
/// of the backend response is kept for `max_missed_polls` successful fetches
/// and then evicted.
pub struct PreviousSnapshots {
    queues: HashMap<String, Retained>,
    max_missed_polls: u32,
}

impl PreviousSnapshots {
    pub fn new(max_missed_polls: u32) -> Self {
        Self {
            queues: HashMap::new(),
            max_missed_polls,
        }
    }

    /// Previous copy of a queue, if any.
    pub fn get(&self, queue_id: &str) -> Option<&Queue> {
        self.queues.get(queue_id).map(|r| &r.queue)
    }

    /// See [`was_in_progress`].
    pub fn was_in_progress(&self, queue_id: &str, recipient: &str) -> bool {
        was_in_progress(self.get(queue_id), recipient)
    }

    /// Store `queue` as the previous copy for its identity.
    pub fn replace(&mut self, queue: Queue) {
        self.queues
            .insert(queue.queue_id.clone(), Retained { queue, missed: 0 });
    }

    /// Record the queues of a successful fetch as the new previous copies
    /// and age out the ones it omitted. Returns the evicted identities.
    pub fn retain_cycle(&mut self, queues: &[Queue]) -> Vec<String> {
        let evicted = self.age_missing(queues.iter().map(|q| q.queue_id.as_str()));
        for queue in queues {
            self.replace(queue.clone());
        }
        evicted
    }

    /// Age out queues that were missing from a successful fetch.
    ///
    /// `seen` holds the identities present in that fetch. Returns the
    /// identities that were evicted.
    pub fn age_missing<'a>(&mut self, seen: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let seen: std::collections::HashSet<&str> = seen.into_iter().collect();
        let limit = self.max_missed_polls;
        let mut evicted = Vec::new();

        self.queues.retain(|id, retained| {
            if seen.contains(id.as_str()) {
                retained.missed = 0;
                return true;
            }
            retained.missed += 1;
            if retained.missed >= limit {
                debug!(queue = %id, missed = retained.missed, "evicting vanished queue");
                evicted.push(id.clone());
                false
            } else {
                true
            }
        });

        evicted
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
