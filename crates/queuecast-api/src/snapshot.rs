// Backend snapshot client
//
// Wraps `reqwest::Client` with the single read-only endpoint the poller
// needs: `GET {base}/queues/all/`, which returns every queue together with
// its entries.

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::QueuesResponse;
use crate::transport::TransportConfig;

const QUEUES_PATH: &str = "queues/all/";

/// Read-only HTTP client for the queue-management backend.
pub struct SnapshotClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SnapshotClient {
    /// Create a new snapshot client from a `TransportConfig`.
    ///
    /// The `base_url` is the backend root, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a snapshot client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the all-queues endpoint.
    pub fn queues_url(&self) -> Result<Url, Error> {
        let full = format!("{}/{QUEUES_PATH}", self.base_url.as_str().trim_end_matches('/'));
        Ok(Url::parse(&full)?)
    }

    /// Fetch every queue and its entries.
    ///
    /// Any status other than 200 is an [`Error::Status`]; an undecodable body
    /// is an [`Error::Deserialization`] carrying the raw text.
    pub async fn fetch_queues(&self) -> Result<QueuesResponse, Error> {
        let url = self.queues_url()?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status != reqwest::StatusCode::OK {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
