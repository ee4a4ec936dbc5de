// ── Wait-time estimation ──
//
// Average service time is taken from services completed within a trailing
// lookback window. A waiting customer's estimate is their position among
// strictly-waiting entries times that average.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::config::EstimatorPolicy;
use crate::model::{Entry, Queue, QueueStats};

/// Computes queue statistics and per-customer wait estimates.
pub struct WaitEstimator {
    policy: EstimatorPolicy,
    clock: Arc<dyn Clock>,
}

impl WaitEstimator {
    pub fn new(policy: EstimatorPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// Statistics for one queue snapshot.
    pub fn compute_stats(&self, queue: &Queue) -> QueueStats {
        let (average, sample_size) = self.average_service_time(&queue.entries);
        let active = queue.active_entries().count();
        let waiting = queue.waiting_entries().count();

        let estimated_wait = if active > 0 && !average.is_zero() {
            scale(average, active)
        } else {
            Duration::ZERO
        };

        QueueStats {
            queue_id: queue.queue_id.clone(),
            queue_name: queue.name.clone(),
            average_service_time: average,
            sample_size,
            active_entries: active,
            waiting_entries: waiting,
            estimated_wait,
        }
    }

    /// Mean service time over the lookback window and the number of services
    /// it was computed from. Falls back to the policy default when nothing
    /// qualifies, reporting a sample size of 0.
    pub fn average_service_time(&self, entries: &[Entry]) -> (Duration, usize) {
        let now = self.clock.now();
        let cutoff = chrono::Duration::from_std(self.policy.lookback_window)
            .ok()
            .and_then(|w| now.checked_sub_signed(w));

        let mut total = Duration::ZERO;
        let mut count: usize = 0;

        for entry in entries {
            let Some(served_at) = entry.served_at else {
                continue;
            };
            if cutoff.is_some_and(|c| served_at < c) {
                continue;
            }
            if let Some(d) = entry.service_duration() {
                total += d;
                count += 1;
            }
        }

        if count == 0 {
            debug!(
                fallback = ?self.policy.fallback_service_time,
                "no recent completed services, using fallback"
            );
            return (self.policy.fallback_service_time, 0);
        }

        let average = total / u32::try_from(count).unwrap_or(u32::MAX);
        debug!(?average, samples = count, "average service time");
        (average, count)
    }

    /// 1-indexed position of `recipient` among strictly-waiting entries, in
    /// arrival order. 0 if the recipient is not waiting.
    pub fn position_of(queue: &Queue, recipient: &str) -> usize {
        queue
            .waiting_entries()
            .position(|e| e.recipient == recipient)
            .map_or(0, |idx| idx + 1)
    }

    /// Estimated wait for `recipient`: position × average service time.
    /// Zero when the recipient is not waiting (being served, left, unknown).
    pub fn estimate_wait_for_recipient(&self, queue: &Queue, recipient: &str) -> Duration {
        let position = Self::position_of(queue, recipient);
        if position == 0 {
            return Duration::ZERO;
        }
        let (average, _) = self.average_service_time(&queue.entries);
        self.wait_for_position(position, average)
    }

    /// Estimated wait for a known position given a precomputed average.
    pub fn wait_for_position(&self, position: usize, average: Duration) -> Duration {
        let average = if average.is_zero() {
            self.policy.fallback_service_time
        } else {
            average
        };
        scale(average, position)
    }
}

fn scale(d: Duration, n: usize) -> Duration {
    d.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX))
}
