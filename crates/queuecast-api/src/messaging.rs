// Messaging API client
//
// Posts plain-text messages to the WhatsApp Cloud API. The bearer token is
// installed once as a default header (marked sensitive so it never shows up
// in debug output); each call is a single POST with no retry.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::TextMessage;
use crate::transport::TransportConfig;

/// HTTP client for the messaging API `messages` endpoint.
pub struct MessagingClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl MessagingClient {
    /// Create a messaging client.
    ///
    /// `api_url` is the versioned API root (e.g.
    /// `https://graph.facebook.com/v23.0`); messages are posted to
    /// `{api_url}/{phone_number_id}/messages`.
    pub fn new(
        api_url: &Url,
        phone_number_id: &str,
        access_token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = messages_endpoint(api_url, phone_number_id)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token.expose_secret()))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, endpoint })
    }

    /// Create a messaging client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for any authentication headers.
    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// The resolved `messages` endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one text message. Succeeds only on a 2xx response.
    pub async fn send_text(&self, to: &str, body: &str, preview_url: bool) -> Result<(), Error> {
        debug!("POST {}", self.endpoint);

        let payload = TextMessage::new(to, body, preview_url);
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Build `{api_url}/{phone_number_id}/messages`.
pub fn messages_endpoint(api_url: &Url, phone_number_id: &str) -> Result<Url, Error> {
    let full = format!(
        "{}/{}/messages",
        api_url.as_str().trim_end_matches('/'),
        phone_number_id.trim_matches('/')
    );
    Ok(Url::parse(&full)?)
}
