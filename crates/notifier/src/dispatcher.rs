//! Broadcast dispatcher.
//!
//! Takes one payload and fans it out to every registered user:
//! 1. Validate the payload (nothing is fetched or sent if it is malformed)
//! 2. Load all recipients from the `RecipientSource`
//! 3. Project each user to the channel's addressee, normalizing phone numbers
//!    and dropping users without one
//! 4. Send to every addressee concurrently, bounded by `max_concurrency`
//! 5. Fold the per-recipient outcomes into a `BatchSummary`
//!
//! A failed send never aborts its siblings; it only shows up in the summary.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use broadcast_common::error::AppError;
use broadcast_common::types::{
    BatchSummary, BroadcastPayload, Channel, DispatchOutcome, Recipient, User,
};

use crate::phone::{PhoneNormalizer, is_deliverable};
use crate::source::RecipientSource;
use crate::transport::{Transport, TransportCause, TransportError};

/// Default upper bound on in-flight sends per batch.
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

/// Default deadline for a single send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Fan-out limits for one batch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Maximum sends in flight at once; values below 1 are treated as 1.
    pub max_concurrency: usize,
    /// Per-send deadline. `None` waits for the transport indefinitely.
    pub send_timeout: Option<Duration>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
        }
    }
}

/// A transport was wired into the slot of a different channel.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{slot} slot was given a transport that delivers {reported}")]
pub struct TransportMismatch {
    pub slot: Channel,
    pub reported: Channel,
}

/// Fans a broadcast out to every registered user over one channel.
pub struct BroadcastDispatcher {
    recipients: Arc<dyn RecipientSource>,
    sms: Arc<dyn Transport>,
    email: Arc<dyn Transport>,
    normalizer: PhoneNormalizer,
    settings: DispatchSettings,
}

impl BroadcastDispatcher {
    pub fn new(
        recipients: Arc<dyn RecipientSource>,
        sms: Arc<dyn Transport>,
        email: Arc<dyn Transport>,
        normalizer: PhoneNormalizer,
        settings: DispatchSettings,
    ) -> Result<Self, TransportMismatch> {
        for (slot, transport) in [(Channel::Sms, &sms), (Channel::Email, &email)] {
            let reported = transport.channel();
            if reported != slot {
                return Err(TransportMismatch { slot, reported });
            }
        }

        Ok(Self {
            recipients,
            sms,
            email,
            normalizer,
            settings,
        })
    }

    /// Broadcast `payload` to all users on the payload's channel.
    ///
    /// Fails only before sending starts: `AppError::Validation` for a bad
    /// payload, `AppError::Repository` if recipients cannot be listed.
    /// Per-recipient failures are reported in the returned summary.
    pub async fn dispatch(&self, payload: &BroadcastPayload) -> Result<BatchSummary, AppError> {
        payload.validate()?;

        let channel = payload.channel();
        let users = self.recipients.list_recipients().await?;
        let total_users = users.len();
        let targets = self.resolve_recipients(channel, &users);

        tracing::info!(
            channel = %channel,
            users = total_users,
            recipients = targets.len(),
            skipped = total_users - targets.len(),
            "Starting broadcast"
        );

        let transport = self.transport_for(channel);
        let limit = self.settings.max_concurrency.max(1);

        // Sends settle in any order; the index restores listing order.
        let mut outcomes: Vec<(usize, DispatchOutcome)> =
            stream::iter(targets.into_iter().enumerate())
                .map(|(index, recipient)| async move {
                    (index, self.deliver(transport, recipient, payload).await)
                })
                .buffer_unordered(limit)
                .collect()
                .await;
        outcomes.sort_unstable_by_key(|(index, _)| *index);

        let summary = BatchSummary::from_outcomes(outcomes.into_iter().map(|(_, o)| o));

        tracing::info!(
            channel = %channel,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Broadcast complete"
        );

        Ok(summary)
    }

    /// Project users to deliverable addressees for `channel`, in listing order.
    pub fn resolve_recipients(&self, channel: Channel, users: &[User]) -> Vec<Recipient> {
        users
            .iter()
            .filter_map(|user| {
                let addressee = match channel {
                    Channel::Sms => self.normalizer.normalize(user.phone_number.as_deref()),
                    Channel::Email => user.email.clone(),
                };
                if !is_deliverable(addressee.as_deref()) {
                    tracing::debug!(
                        user_id = %user.id,
                        channel = %channel,
                        "No addressee, skipping"
                    );
                    return None;
                }
                addressee.map(|addressee| Recipient {
                    user_id: user.id,
                    addressee,
                })
            })
            .collect()
    }

    fn transport_for(&self, channel: Channel) -> &dyn Transport {
        match channel {
            Channel::Sms => self.sms.as_ref(),
            Channel::Email => self.email.as_ref(),
        }
    }

    /// Send to one recipient, converting every failure into an outcome.
    async fn deliver(
        &self,
        transport: &dyn Transport,
        recipient: Recipient,
        payload: &BroadcastPayload,
    ) -> DispatchOutcome {
        let send = transport.send(&recipient.addressee, payload);
        let result = match self.settings.send_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, send).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::new(
                    recipient.addressee.as_str(),
                    TransportCause::Timeout(deadline),
                )),
            },
            None => send.await,
        };

        match result {
            Ok(receipt) => {
                tracing::debug!(
                    user_id = %recipient.user_id,
                    to = %recipient.addressee,
                    provider_id = %receipt.provider_id,
                    "Message sent"
                );
                DispatchOutcome::Sent(recipient)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %recipient.user_id,
                    to = %recipient.addressee,
                    error = %e.cause,
                    "Failed to send message"
                );
                DispatchOutcome::Failed(recipient, e.cause.to_string())
            }
        }
    }
}
