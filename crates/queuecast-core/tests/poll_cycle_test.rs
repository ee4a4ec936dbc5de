#![allow(clippy::unwrap_used)]
// Drives whole poll cycles against a scripted snapshot source and a
// recording sink, moving a manual clock between cycles.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use url::Url;

use queuecast_core::{
    AlertDispatcher, AlertSink, Channel, Clock, CoreError, CycleReport, Entry, EntryStatus,
    ManualClock, Queue, Scheduler, ServiceConfig, SnapshotSource,
};

// ── Fixtures ────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Queue>, CoreError>>>,
}

impl ScriptedSource {
    fn push(&self, response: Result<Vec<Queue>, CoreError>) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<Queue>, CoreError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    async fn send(&self, recipient: &str, text: &str) -> Result<(), CoreError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_owned(), text.to_owned()));
        Ok(())
    }
}

struct Harness {
    scheduler: Scheduler,
    source: Arc<ScriptedSource>,
    sink: Arc<RecordingSink>,
    clock: Arc<ManualClock>,
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn service_config() -> ServiceConfig {
    ServiceConfig::new(Url::parse("http://127.0.0.1:8000").unwrap())
}

fn harness(config: ServiceConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(t0()));
    let source = Arc::new(ScriptedSource::default());
    let sink = Arc::new(RecordingSink::default());
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let dispatcher =
        AlertDispatcher::new(config.dispatch.clone(), Arc::clone(&dyn_clock)).with_sink(sink.clone());
    let scheduler = Scheduler::new(config, source.clone(), dispatcher, dyn_clock);

    Harness {
        scheduler,
        source,
        sink,
        clock,
    }
}

fn entry(recipient: &str, status: EntryStatus) -> Entry {
    Entry {
        id: format!("e-{recipient}"),
        recipient: recipient.into(),
        full_name: None,
        joined_at: None,
        left: false,
        status,
        started_at: None,
        served_at: None,
    }
}

fn queue(entries: Vec<Entry>) -> Queue {
    Queue {
        queue_id: "q-1".into(),
        name: "Pharmacy".into(),
        description: String::new(),
        created_at: None,
        entries,
    }
}

// ── Cycles ──────────────────────────────────────────────────────────

#[tokio::test]
async fn first_cycle_alerts_every_active_customer() {
    let mut h = harness(service_config());
    let mut gone = entry("gone", EntryStatus::Waiting);
    gone.left = true;
    h.source.push(Ok(vec![queue(vec![
        entry("served", EntryStatus::Served),
        entry("now", EntryStatus::InProgress),
        gone,
        entry("first", EntryStatus::Waiting),
        entry("second", EntryStatus::Waiting),
        entry("third", EntryStatus::Waiting),
    ])]));

    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(
        report,
        CycleReport {
            queues: 1,
            attempted: 4,
            delivered: 4,
            ..CycleReport::default()
        }
    );

    let sent = h.sink.take();
    assert_eq!(
        sent,
        vec![
            (
                "now".to_string(),
                "🔔 You're now being served! Please proceed to the counter.".to_string()
            ),
            (
                "first".to_string(),
                "⏰ You're NEXT! Please be ready. Estimated wait: 0-2 minutes".to_string()
            ),
            (
                "second".to_string(),
                "📍 Position #2 - You're almost up! Estimated wait: 10 minutes".to_string()
            ),
            (
                "third".to_string(),
                "📋 Position #3 in Pharmacy. Estimated wait: 15 minutes".to_string()
            ),
        ]
    );

    let stats = h.scheduler.stats().borrow().clone();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].active_entries, 4);
    assert_eq!(stats[0].waiting_entries, 3);
}

#[tokio::test]
async fn now_serving_fires_once_per_transition() {
    let mut h = harness(service_config());

    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::Waiting)])]));
    h.scheduler.run_cycle().await.unwrap();
    h.sink.take();

    h.clock.advance(Duration::from_secs(300));
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(h.sink.take()[0].1.contains("now being served"));

    // Still in progress well past the rate-limit window: no repeat.
    h.clock.advance(Duration::from_secs(900));
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.attempted, 0);
    assert!(h.sink.take().is_empty());
}

#[tokio::test]
async fn now_serving_inside_a_position_update_window_is_not_retried() {
    let mut h = harness(service_config());

    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::Waiting)])]));
    h.scheduler.run_cycle().await.unwrap();
    assert_eq!(h.sink.take().len(), 1);

    // Default cadence: the rising edge shares the key of the update sent
    // one poll earlier.
    h.clock.advance(Duration::from_secs(60));
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.rate_limited, 1);
    assert!(h.sink.take().is_empty());

    // The edge has passed, so nothing is sent once the window opens.
    h.clock.advance(Duration::from_secs(300));
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.attempted, 0);
    assert!(h.sink.take().is_empty());
}

#[tokio::test]
async fn recipient_listed_twice_is_told_the_earlier_position() {
    let mut h = harness(service_config());

    h.source.push(Ok(vec![queue(vec![
        entry("a", EntryStatus::Waiting),
        entry("b", EntryStatus::Waiting),
        entry("a", EntryStatus::Waiting),
    ])]));
    let report = h.scheduler.run_cycle().await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.rate_limited, 1);
    assert_eq!(
        h.sink.take(),
        vec![
            (
                "a".to_string(),
                "⏰ You're NEXT! Please be ready. Estimated wait: 0-2 minutes".to_string()
            ),
            (
                "b".to_string(),
                "📍 Position #2 - You're almost up! Estimated wait: 10 minutes".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn waiting_updates_repeat_once_the_window_passes() {
    let mut h = harness(service_config());
    let snapshot = || Ok(vec![queue(vec![entry("a", EntryStatus::Waiting)])]);

    h.source.push(snapshot());
    assert_eq!(h.scheduler.run_cycle().await.unwrap().delivered, 1);

    h.clock.advance(Duration::from_secs(60));
    h.source.push(snapshot());
    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.rate_limited, 1);
    assert_eq!(report.delivered, 0);

    h.clock.advance(Duration::from_secs(240));
    h.source.push(snapshot());
    assert_eq!(h.scheduler.run_cycle().await.unwrap().delivered, 1);

    assert_eq!(h.sink.take().len(), 2);
}

#[tokio::test]
async fn failed_fetch_leaves_previous_state_untouched() {
    let mut h = harness(service_config());

    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    h.scheduler.run_cycle().await.unwrap();
    h.sink.take();

    h.clock.advance(Duration::from_secs(600));
    h.source.push(Err(CoreError::Timeout));
    assert!(matches!(
        h.scheduler.run_cycle().await,
        Err(CoreError::Timeout)
    ));
    assert_eq!(h.scheduler.previous().len(), 1);

    h.clock.advance(Duration::from_secs(600));
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    let report = h.scheduler.run_cycle().await.unwrap();
    assert_eq!(report.attempted, 0);
}

#[tokio::test]
async fn vanished_queue_is_forgotten_after_missed_polls() {
    let config = ServiceConfig {
        max_missed_polls: 2,
        ..service_config()
    };
    let mut h = harness(config);

    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    h.scheduler.run_cycle().await.unwrap();

    h.source.push(Ok(Vec::new()));
    assert_eq!(h.scheduler.run_cycle().await.unwrap().evicted, 0);
    h.source.push(Ok(Vec::new()));
    assert_eq!(h.scheduler.run_cycle().await.unwrap().evicted, 1);
    assert!(h.scheduler.previous().is_empty());

    // Back with the same customer in progress: treated as a fresh transition.
    h.sink.take();
    h.clock.advance(Duration::from_secs(600));
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::InProgress)])]));
    assert_eq!(h.scheduler.run_cycle().await.unwrap().delivered, 1);
}

#[tokio::test]
async fn default_channel_without_sink_drops_alerts() {
    let config = ServiceConfig {
        default_channel: Channel::Ussd,
        ..service_config()
    };
    let mut h = harness(config);

    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::Waiting)])]));
    let report = h.scheduler.run_cycle().await.unwrap();

    assert_eq!(report.unknown_channel, 1);
    assert_eq!(h.scheduler.dispatcher().ledger_len(), 0);
    assert!(h.sink.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn spawned_loop_stops_on_request() {
    let h = harness(service_config());
    h.source.push(Ok(vec![queue(vec![entry("a", EntryStatus::Waiting)])]));
    let sink = Arc::clone(&h.sink);

    let handle = h.scheduler.spawn();
    let mut stats = handle.stats();
    stats.changed().await.unwrap();
    assert_eq!(stats.borrow().len(), 1);

    handle.stop().await;
    assert_eq!(sink.take().len(), 1);
}
