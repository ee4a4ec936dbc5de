// ── Runtime service configuration ──
//
// These types describe *how* the poller behaves: where the backend lives,
// how often to poll, and the estimation and alerting policies. They carry
// credential data but never touch disk. The config crate builds a
// `ServiceConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::Channel;

/// Wait-time estimation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimatorPolicy {
    /// Only services completed within this trailing window count toward the
    /// average.
    pub lookback_window: Duration,
    /// Average service time assumed when no completed service qualifies.
    pub fallback_service_time: Duration,
}

impl Default for EstimatorPolicy {
    fn default() -> Self {
        Self {
            lookback_window: Duration::from_secs(30 * 60),
            fallback_service_time: Duration::from_secs(5 * 60),
        }
    }
}

/// When a dispatch attempt is written to the rate-limit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerPolicy {
    /// Record every attempt that reached a sink, delivered or not. At most one
    /// attempt per key per window; failed deliveries are not retried until
    /// the window passes.
    #[default]
    RecordAttempts,
    /// Record confirmed deliveries only. A failed send is attempted again on
    /// the next cycle.
    RecordSuccesses,
}

/// Alert dispatch policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Minimum spacing between two alerts for the same
    /// (recipient, queue, channel).
    pub rate_limit_window: Duration,
    /// Upper bound on a single sink call.
    pub send_timeout: Duration,
    pub ledger: LedgerPolicy,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            rate_limit_window: Duration::from_secs(5 * 60),
            send_timeout: Duration::from_secs(30),
            ledger: LedgerPolicy::default(),
        }
    }
}

/// Messaging API (WhatsApp Cloud API) connection settings.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Versioned API root, e.g. `https://graph.facebook.com/v23.0`.
    pub api_url: Url,
    pub phone_number_id: String,
    pub access_token: SecretString,
    pub preview_url: bool,
}

/// Everything the poller needs to run.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Backend root URL; snapshots come from `{backend_url}/queues/all/`.
    pub backend_url: Url,
    /// Extra CA certificate (PEM) trusted for the backend connection.
    pub backend_ca_cert: Option<PathBuf>,
    /// Timeout for one snapshot fetch.
    pub fetch_timeout: Duration,
    pub poll_interval: Duration,
    /// Channel used for every alert the poller generates.
    pub default_channel: Channel,
    /// A queue missing from this many consecutive successful fetches is
    /// dropped from the previous-snapshot map.
    pub max_missed_polls: u32,
    pub estimator: EstimatorPolicy,
    pub dispatch: DispatchPolicy,
    /// `None` disables the messaging sink.
    pub messaging: Option<MessagingConfig>,
}

impl ServiceConfig {
    /// Default policies against `backend_url`, with messaging disabled.
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            backend_ca_cert: None,
            fetch_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(60),
            default_channel: Channel::WhatsApp,
            max_missed_polls: 3,
            estimator: EstimatorPolicy::default(),
            dispatch: DispatchPolicy::default(),
            messaging: None,
        }
    }
}

/// Default backend location.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
