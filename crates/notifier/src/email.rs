//! Email delivery through the Resend HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use broadcast_common::types::{BroadcastPayload, Channel};

use crate::transport::{
    DEFAULT_REQUEST_TIMEOUT, SendReceipt, Transport, TransportCause, TransportError,
    map_request_error, provider_error_detail,
};

/// Resend credentials and sender address.
#[derive(Debug, Clone)]
pub struct ResendSettings {
    /// e.g. `https://api.resend.com`
    pub api_base: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// Email transport backed by Resend.
pub struct EmailTransport {
    client: reqwest::Client,
    settings: ResendSettings,
    request_timeout: Duration,
}

impl EmailTransport {
    pub fn new(client: reqwest::Client, settings: ResendSettings) -> Self {
        Self {
            client,
            settings,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.settings.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transport for EmailTransport {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(
        &self,
        addressee: &str,
        payload: &BroadcastPayload,
    ) -> Result<SendReceipt, TransportError> {
        tracing::debug!(to = %addressee, "Sending email");

        let request = SendEmailRequest {
            from: &self.settings.from,
            to: [addressee],
            subject: payload.subject().unwrap_or_default(),
            text: payload.body(),
        };

        let response = self
            .client
            .post(self.emails_url())
            .bearer_auth(&self.settings.api_key)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_error(addressee, self.request_timeout, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_request_error(addressee, self.request_timeout, e))?;

        if !status.is_success() {
            return Err(TransportError::new(
                addressee,
                TransportCause::Rejected {
                    status: status.as_u16(),
                    detail: provider_error_detail(&body),
                },
            ));
        }

        let id = serde_json::from_str::<SendEmailResponse>(&body)
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_default();

        Ok(SendReceipt { provider_id: id })
    }
}
