//! Notification transport abstraction shared by the SMS and email senders.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use broadcast_common::types::{BroadcastPayload, Channel};

/// Default per-request HTTP timeout for provider calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider-assigned message id (Twilio SID, Resend id, ...)
    pub provider_id: String,
}

/// Why a single send failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportCause {
    #[error("provider rejected message (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// A failed delivery to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delivery to {recipient} failed: {cause}")]
pub struct TransportError {
    pub recipient: String,
    pub cause: TransportCause,
}

impl TransportError {
    pub fn new(recipient: impl Into<String>, cause: TransportCause) -> Self {
        Self {
            recipient: recipient.into(),
            cause,
        }
    }
}

/// Delivers one message to one addressee over a single channel.
#[async_trait]
pub trait Transport: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(
        &self,
        addressee: &str,
        payload: &BroadcastPayload,
    ) -> Result<SendReceipt, TransportError>;
}

/// Best-effort extraction of the provider's error message from a response body.
///
/// Twilio and Resend both put it under `message`; fall back to the raw body.
pub(crate) fn provider_error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ProviderError {
        message: String,
    }

    match serde_json::from_str::<ProviderError>(body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Turn a `reqwest` failure into a transport error for `recipient`.
pub(crate) fn map_request_error(
    recipient: &str,
    timeout: Duration,
    err: reqwest::Error,
) -> TransportError {
    let cause = if err.is_timeout() {
        TransportCause::Timeout(timeout)
    } else {
        TransportCause::Network(err.to_string())
    };
    TransportError::new(recipient, cause)
}
