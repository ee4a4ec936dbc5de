// ── Delivery sinks ──
//
// One sink per channel. A sink only delivers; rate limiting and timeouts
// are the dispatcher's job.

use async_trait::async_trait;
use tracing::info;

use queuecast_api::MessagingClient;

use crate::config::MessagingConfig;
use crate::error::CoreError;
use crate::model::Channel;

/// Delivers rendered alert text to a recipient over one channel.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Channel this sink serves.
    fn channel(&self) -> Channel;

    async fn send(&self, recipient: &str, text: &str) -> Result<(), CoreError>;
}

/// Sends text messages through the WhatsApp Cloud API.
pub struct MessagingSink {
    client: MessagingClient,
    preview_url: bool,
}

impl MessagingSink {
    pub fn new(client: MessagingClient, preview_url: bool) -> Self {
        Self {
            client,
            preview_url,
        }
    }

    /// Build a client from messaging settings.
    pub fn from_config(
        config: &MessagingConfig,
        transport: &queuecast_api::TransportConfig,
    ) -> Result<Self, CoreError> {
        let client = MessagingClient::new(
            &config.api_url,
            &config.phone_number_id,
            &config.access_token,
            transport,
        )?;
        Ok(Self::new(client, config.preview_url))
    }
}

#[async_trait]
impl AlertSink for MessagingSink {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    async fn send(&self, recipient: &str, text: &str) -> Result<(), CoreError> {
        self.client
            .send_text(recipient, text, self.preview_url)
            .await
            .map_err(|e| CoreError::delivery(Channel::WhatsApp, &e))
    }
}

/// Writes alerts to the log instead of delivering them.
///
/// Stands in for channels without a gateway integration (USSD push, web
/// clients) so alerts routed there are still visible and rate-limited.
#[derive(Debug, Clone, Copy)]
pub struct LoggingSink {
    channel: Channel,
}

impl LoggingSink {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl AlertSink for LoggingSink {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, recipient: &str, text: &str) -> Result<(), CoreError> {
        info!(channel = %self.channel, recipient, text, "alert");
        Ok(())
    }
}
