// ── Domain model ──

mod alert;
mod queue;
mod stats;

pub use alert::{AlertMessage, AlertRequest, Channel};
pub use queue::{Entry, EntryStatus, Queue};
pub use stats::QueueStats;
