//! SMS delivery through the Twilio Messages REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use broadcast_common::types::{BroadcastPayload, Channel};

use crate::transport::{
    DEFAULT_REQUEST_TIMEOUT, SendReceipt, Transport, TransportCause, TransportError,
    map_request_error, provider_error_detail,
};

/// Twilio account credentials and sender ID.
#[derive(Debug, Clone)]
pub struct TwilioSettings {
    /// e.g. `https://api.twilio.com`
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender phone number or alphanumeric sender ID
    pub from: String,
}

/// Subset of Twilio's message resource we care about.
#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: Option<String>,
}

/// Text-message transport backed by Twilio.
pub struct SmsTransport {
    client: reqwest::Client,
    settings: TwilioSettings,
    request_timeout: Duration,
}

impl SmsTransport {
    pub fn new(client: reqwest::Client, settings: TwilioSettings) -> Self {
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

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.account_sid
        )
    }
}

#[async_trait]
impl Transport for SmsTransport {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(
        &self,
        addressee: &str,
        payload: &BroadcastPayload,
    ) -> Result<SendReceipt, TransportError> {
        tracing::debug!(to = %addressee, "Sending SMS");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .timeout(self.request_timeout)
            .form(&[
                ("To", addressee),
                ("From", self.settings.from.as_str()),
                ("Body", payload.body()),
            ])
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

        let sid = serde_json::from_str::<TwilioMessage>(&body)
            .ok()
            .and_then(|m| m.sid)
            .unwrap_or_default();

        Ok(SendReceipt { provider_id: sid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn transport(base_url: String) -> SmsTransport {
        SmsTransport::new(
            reqwest::Client::new(),
            TwilioSettings {
                api_base: base_url,
                account_sid: "AC123".to_string(),
                auth_token: "token".to_string(),
                from: "+15550001111".to_string(),
            },
        )
    }

    #[test]
    fn test_messages_url_tolerates_trailing_slash() {
        let t = transport("https://api.twilio.com/".to_string());
        assert_eq!(
            t.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[tokio::test]
    async fn test_send_returns_message_sid() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/2010-04-01/Accounts/AC123/Messages.json")
                    .header_exists("authorization");
                then.status(201)
                    .header("content-type", "application/json")
                    .body(r#"{"sid": "SM42", "status": "queued"}"#);
            })
            .await;

        let receipt = transport(server.base_url())
            .send("+94771234567", &BroadcastPayload::text("hello"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(receipt.provider_id, "SM42");
    }

    #[tokio::test]
    async fn test_provider_rejection_mapped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400)
                    .header("content-type", "application/json")
                    .body(r#"{"code": 21211, "message": "Invalid 'To' Phone Number"}"#);
            })
            .await;

        let err = transport(server.base_url())
            .send("+94000", &BroadcastPayload::text("hello"))
            .await
            .unwrap_err();

        assert_eq!(err.recipient, "+94000");
        assert_eq!(
            err.cause,
            TransportCause::Rejected {
                status: 400,
                detail: "Invalid 'To' Phone Number".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        // Port 9 (discard) is not expected to be listening.
        let err = transport("http://127.0.0.1:9".to_string())
            .send("+94771234567", &BroadcastPayload::text("hello"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.cause,
            TransportCause::Network(_) | TransportCause::Timeout(_)
        ));
    }
}
