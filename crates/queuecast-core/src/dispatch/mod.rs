// ── Alert dispatch ──
//
// Channel sinks behind a shared rate-limit ledger.

mod dispatcher;
mod ledger;
mod sink;

pub use dispatcher::{AlertDispatcher, DispatchOutcome};
pub use ledger::{HISTORY_WINDOW, LedgerKey};
pub use sink::{AlertSink, LoggingSink, MessagingSink};
