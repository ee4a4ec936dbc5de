// ── Snapshot sources ──
//
// Where the poller gets queue snapshots from. The HTTP source is the only
// production implementation; tests script their own.

use async_trait::async_trait;
use tracing::debug;

use queuecast_api::{SnapshotClient, TlsMode, TransportConfig};

use crate::config::ServiceConfig;
use crate::convert::queues_from_response;
use crate::error::CoreError;
use crate::model::Queue;

/// Produces the current list of queues, each with its entries.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Queue>, CoreError>;
}

/// Fetches `{backend_url}/queues/all/` over HTTP.
pub struct HttpSnapshotSource {
    client: SnapshotClient,
}

impl HttpSnapshotSource {
    pub fn new(config: &ServiceConfig) -> Result<Self, CoreError> {
        let mut transport = TransportConfig::with_timeout(config.fetch_timeout);
        if let Some(ref ca) = config.backend_ca_cert {
            transport.tls = TlsMode::CustomCa(ca.clone());
        }
        let client = SnapshotClient::new(config.backend_url.clone(), &transport)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<Vec<Queue>, CoreError> {
        let resp = self.client.fetch_queues().await?;
        let queues = queues_from_response(resp);
        debug!(queues = queues.len(), "fetched snapshot");
        Ok(queues)
    }
}
