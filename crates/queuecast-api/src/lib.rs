// queuecast-api: Async HTTP clients for the queue backend and the messaging API

pub mod error;
pub mod messaging;
pub mod models;
pub mod snapshot;
pub mod transport;

pub use error::Error;
pub use messaging::MessagingClient;
pub use models::{QueuesResponse, RawEntry, RawQueue, TextBody, TextMessage};
pub use snapshot::SnapshotClient;
pub use transport::{TlsMode, TransportConfig};
