// ── Poll loop ──
//
// One cycle: fetch every queue, compute stats, decide per entry whether an
// alert is due, dispatch it, then keep the snapshot for the next cycle's
// transition checks. Cycles never overlap.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::dispatch::{AlertDispatcher, DispatchOutcome, HISTORY_WINDOW};
use crate::error::CoreError;
use crate::estimator::WaitEstimator;
use crate::model::{AlertMessage, AlertRequest, Queue, QueueStats};
use crate::source::{HttpSnapshotSource, SnapshotSource};
use crate::transition::PreviousSnapshots;

/// Tally of one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub queues: usize,
    pub attempted: usize,
    pub delivered: usize,
    pub rate_limited: usize,
    pub failed: usize,
    pub unknown_channel: usize,
    /// Queues dropped from the previous-snapshot map this cycle.
    pub evicted: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: DispatchOutcome) {
        self.attempted += 1;
        match outcome {
            DispatchOutcome::Delivered => self.delivered += 1,
            DispatchOutcome::RateLimited => self.rate_limited += 1,
            DispatchOutcome::UnknownChannel => self.unknown_channel += 1,
            DispatchOutcome::Failed => self.failed += 1,
        }
    }
}

/// Drives the fetch → estimate → detect → dispatch pipeline.
pub struct Scheduler {
    config: ServiceConfig,
    source: Arc<dyn SnapshotSource>,
    estimator: WaitEstimator,
    dispatcher: AlertDispatcher,
    previous: PreviousSnapshots,
    clock: Arc<dyn Clock>,
    stats_tx: watch::Sender<Arc<Vec<QueueStats>>>,
}

impl Scheduler {
    pub fn new(
        config: ServiceConfig,
        source: Arc<dyn SnapshotSource>,
        dispatcher: AlertDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let estimator = WaitEstimator::new(config.estimator.clone(), Arc::clone(&clock));
        let previous = PreviousSnapshots::new(config.max_missed_polls);
        let (stats_tx, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            config,
            source,
            estimator,
            dispatcher,
            previous,
            clock,
            stats_tx,
        }
    }

    /// Production wiring: HTTP snapshot source, wall clock and the sinks
    /// from [`AlertDispatcher::from_config`].
    pub fn from_config(config: ServiceConfig) -> Result<Self, CoreError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let source = Arc::new(HttpSnapshotSource::new(&config)?);
        let dispatcher = AlertDispatcher::from_config(&config, Arc::clone(&clock))?;
        Ok(Self::new(config, source, dispatcher, clock))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn previous(&self) -> &PreviousSnapshots {
        &self.previous
    }

    /// Subscribe to the per-queue stats published after each cycle.
    pub fn stats(&self) -> watch::Receiver<Arc<Vec<QueueStats>>> {
        self.stats_tx.subscribe()
    }

    /// Run one cycle.
    ///
    /// A failed fetch returns the error and leaves the previous-snapshot
    /// state untouched. Delivery failures are counted in the report only.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CoreError> {
        let queues = self.source.fetch().await?;

        let mut report = CycleReport {
            queues: queues.len(),
            ..CycleReport::default()
        };
        let mut all_stats = Vec::with_capacity(queues.len());

        for queue in &queues {
            let stats = self.estimator.compute_stats(queue);
            debug!(
                queue = %queue.queue_id,
                active = stats.active_entries,
                waiting = stats.waiting_entries,
                average = ?stats.average_service_time,
                "queue stats"
            );

            for request in self.alerts_for(queue, &stats) {
                let outcome = self.dispatcher.send(&request).await;
                report.record(outcome);
            }
            all_stats.push(stats);
        }

        report.evicted = self.previous.retain_cycle(&queues).len();
        self.stats_tx.send_replace(Arc::new(all_stats));

        debug!(?report, "cycle complete");
        Ok(report)
    }

    /// Alerts due for `queue` this cycle, in entry order.
    fn alerts_for(&self, queue: &Queue, stats: &QueueStats) -> Vec<AlertRequest> {
        let now = self.clock.now();
        let mut waiting_position = 0;
        let mut requests = Vec::new();

        for entry in queue.entries.iter().filter(|e| e.is_active()) {
            let message = if entry.is_in_progress() {
                if self.previous.was_in_progress(&queue.queue_id, &entry.recipient) {
                    None
                } else {
                    Some(AlertMessage::NowServing)
                }
            } else if entry.is_waiting() {
                // Counted per entry. A recipient listed twice is told the
                // earlier position; the later alert shares its ledger key.
                waiting_position += 1;
                let wait = self
                    .estimator
                    .wait_for_position(waiting_position, stats.average_service_time);
                AlertMessage::for_position(waiting_position, &queue.name, wait)
            } else {
                None
            };

            if let Some(message) = message {
                requests.push(AlertRequest {
                    recipient: entry.recipient.clone(),
                    message: message.to_string(),
                    channel: self.config.default_channel,
                    queue_id: queue.queue_id.clone(),
                    timestamp: now,
                });
            }
        }

        requests
    }

    /// Poll until `cancel` fires. The first cycle runs immediately; a cycle
    /// in flight when cancellation arrives is abandoned.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval = ?self.config.poll_interval,
            channel = %self.config.default_channel,
            "poll loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.run_cycle() => result,
            };

            match result {
                Ok(report) if report.attempted > 0 => info!(
                    queues = report.queues,
                    delivered = report.delivered,
                    rate_limited = report.rate_limited,
                    failed = report.failed,
                    alerts_24h = self.dispatcher.sent_within(HISTORY_WINDOW),
                    "cycle dispatched alerts"
                ),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "snapshot fetch failed, skipping cycle"),
            }
        }

        info!("poll loop stopped");
    }

    /// Move the scheduler onto its own task.
    pub fn spawn(mut self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let stats = self.stats();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token).await });
        SchedulerHandle {
            cancel,
            task,
            stats,
        }
    }
}

/// Control handle for a spawned [`Scheduler`].
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    stats: watch::Receiver<Arc<Vec<QueueStats>>>,
}

impl SchedulerHandle {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> watch::Receiver<Arc<Vec<QueueStats>>> {
        self.stats.clone()
    }

    /// Cancel the loop and wait for its task to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "poll task ended abnormally");
        }
    }
}
