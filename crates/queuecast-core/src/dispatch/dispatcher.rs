// ── Alert dispatcher ──
//
// Routes an alert to the sink registered for its channel, at most once per
// (recipient, queue, channel) per rate-limit window. Delivery failures are
// logged and reported as an outcome; they never propagate to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::Display;
use tracing::{debug, info, warn};

use super::ledger::{HISTORY_WINDOW, Ledger, LedgerKey};
use super::sink::{AlertSink, LoggingSink, MessagingSink};
use crate::clock::Clock;
use crate::config::{DispatchPolicy, LedgerPolicy, ServiceConfig};
use crate::error::CoreError;
use crate::model::{AlertRequest, Channel};

/// What happened to one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchOutcome {
    /// The sink accepted the alert.
    Delivered,
    /// Suppressed: the same key was sent within the window.
    RateLimited,
    /// No sink is registered for the requested channel.
    UnknownChannel,
    /// The sink errored or timed out.
    Failed,
}

/// Rate-limited, multi-channel alert delivery.
pub struct AlertDispatcher {
    sinks: HashMap<Channel, Arc<dyn AlertSink>>,
    ledger: Ledger,
    policy: DispatchPolicy,
    clock: Arc<dyn Clock>,
}

impl AlertDispatcher {
    pub fn new(policy: DispatchPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            sinks: HashMap::new(),
            ledger: Ledger::new(),
            policy,
            clock,
        }
    }

    /// Production sinks: the messaging sink when credentials are configured,
    /// and log-only sinks for the USSD and websocket channels.
    pub fn from_config(config: &ServiceConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let mut dispatcher = Self::new(config.dispatch.clone(), clock);

        if let Some(ref messaging) = config.messaging {
            let transport =
                queuecast_api::TransportConfig::with_timeout(config.dispatch.send_timeout);
            dispatcher.register(Arc::new(MessagingSink::from_config(messaging, &transport)?));
        } else {
            warn!("no messaging credentials configured, whatsapp alerts will be dropped");
        }
        dispatcher.register(Arc::new(LoggingSink::new(Channel::Ussd)));
        dispatcher.register(Arc::new(LoggingSink::new(Channel::WebSocket)));

        if !dispatcher.has_sink(config.default_channel) {
            warn!(channel = %config.default_channel, "default channel has no sink");
        }
        Ok(dispatcher)
    }

    /// Register `sink` for its channel, replacing any previous one.
    pub fn register(&mut self, sink: Arc<dyn AlertSink>) {
        let channel = sink.channel();
        if self.sinks.insert(channel, sink).is_some() {
            debug!(%channel, "replaced alert sink");
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.register(sink);
        self
    }

    pub fn has_sink(&self, channel: Channel) -> bool {
        self.sinks.contains_key(&channel)
    }

    /// Deliver one alert, subject to the rate limit.
    pub async fn send(&self, request: &AlertRequest) -> DispatchOutcome {
        let outcome = self.dispatch(request).await;
        self.ledger
            .prune(self.clock.now(), self.policy.rate_limit_window);
        outcome
    }

    async fn dispatch(&self, request: &AlertRequest) -> DispatchOutcome {
        let key = LedgerKey::from(request);
        let now = self.clock.now();

        if self
            .ledger
            .is_limited(&key, now, self.policy.rate_limit_window)
        {
            debug!(
                recipient = %request.recipient,
                queue = %request.queue_id,
                channel = %request.channel,
                "rate limited"
            );
            return DispatchOutcome::RateLimited;
        }

        let Some(sink) = self.sinks.get(&request.channel) else {
            warn!(
                channel = %request.channel,
                recipient = %request.recipient,
                "no sink registered for channel, dropping alert"
            );
            return DispatchOutcome::UnknownChannel;
        };

        let result =
            tokio::time::timeout(self.policy.send_timeout, sink.send(&request.recipient, &request.message))
                .await;

        let outcome = match result {
            Ok(Ok(())) => {
                info!(
                    recipient = %request.recipient,
                    queue = %request.queue_id,
                    channel = %request.channel,
                    "alert delivered"
                );
                DispatchOutcome::Delivered
            }
            Ok(Err(e)) => {
                warn!(
                    recipient = %request.recipient,
                    channel = %request.channel,
                    error = %e,
                    "alert delivery failed"
                );
                DispatchOutcome::Failed
            }
            Err(_) => {
                warn!(
                    recipient = %request.recipient,
                    channel = %request.channel,
                    timeout = ?self.policy.send_timeout,
                    "alert delivery timed out"
                );
                DispatchOutcome::Failed
            }
        };

        let record = match self.policy.ledger {
            LedgerPolicy::RecordAttempts => true,
            LedgerPolicy::RecordSuccesses => outcome == DispatchOutcome::Delivered,
        };
        if record {
            self.ledger.record(key, request.timestamp);
        }

        outcome
    }

    /// Number of keys currently held in the rate-limit ledger.
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    /// Number of alerts recorded within the trailing `window`. Windows
    /// longer than [`HISTORY_WINDOW`] count the whole history.
    pub fn sent_within(&self, window: std::time::Duration) -> usize {
        let now = self.clock.now();
        let since = chrono::Duration::from_std(window.min(HISTORY_WINDOW))
            .ok()
            .and_then(|w| now.checked_sub_signed(w))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.ledger.count_since(since)
    }
}
