// queuecast-core: Wait-time estimation, transition detection and rate-limited
// alert dispatch on top of queuecast-api.

pub mod clock;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod estimator;
pub mod model;
pub mod scheduler;
pub mod source;
pub mod transition;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DispatchPolicy, EstimatorPolicy, LedgerPolicy, MessagingConfig, ServiceConfig};
pub use dispatch::{
    AlertDispatcher, AlertSink, DispatchOutcome, HISTORY_WINDOW, LoggingSink, MessagingSink,
};
pub use error::CoreError;
pub use estimator::WaitEstimator;
pub use scheduler::{CycleReport, Scheduler, SchedulerHandle};
pub use source::{HttpSnapshotSource, SnapshotSource};
pub use transition::PreviousSnapshots;

pub use model::{AlertMessage, AlertRequest, Channel, Entry, EntryStatus, Queue, QueueStats};
