use std::time::Duration;

use serde::Serialize;

/// Per-queue statistics for one poll cycle. Recomputed every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub queue_id: String,
    pub queue_name: String,
    /// Mean service time over the lookback window, or the configured fallback.
    pub average_service_time: Duration,
    /// Completed services that contributed to the average. 0 means the
    /// fallback was used.
    pub sample_size: usize,
    /// Entries that have not left and are not served.
    pub active_entries: usize,
    /// Strictly waiting entries.
    pub waiting_entries: usize,
    /// `active_entries × average_service_time`, or zero.
    pub estimated_wait: Duration,
}
