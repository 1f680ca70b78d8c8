use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppError;

/// Broadcast delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Sms,
    Email,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Sms => write!(f, "sms"),
            Channel::Email => write!(f, "email"),
        }
    }
}

/// A registered user, as stored in the recipient repository.
///
/// Email and phone number are mandatory when a user signs up, but are read as
/// optional so that incomplete rows are skipped instead of failing the listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: NaiveDate,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Body of a text-message broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPayload {
    pub body: String,
}

/// Subject and body of an email broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPayload {
    pub subject: String,
    pub body: String,
}

/// What to broadcast. The variant decides the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastPayload {
    Text(TextPayload),
    Email(EmailPayload),
}

impl BroadcastPayload {
    pub fn text(body: impl Into<String>) -> Self {
        BroadcastPayload::Text(TextPayload { body: body.into() })
    }

    pub fn email(subject: impl Into<String>, body: impl Into<String>) -> Self {
        BroadcastPayload::Email(EmailPayload {
            subject: subject.into(),
            body: body.into(),
        })
    }

    pub fn channel(&self) -> Channel {
        match self {
            BroadcastPayload::Text(_) => Channel::Sms,
            BroadcastPayload::Email(_) => Channel::Email,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            BroadcastPayload::Text(p) => &p.body,
            BroadcastPayload::Email(p) => &p.body,
        }
    }

    /// Email subject; text messages have none.
    pub fn subject(&self) -> Option<&str> {
        match self {
            BroadcastPayload::Text(_) => None,
            BroadcastPayload::Email(p) => Some(&p.subject),
        }
    }

    /// Reject payloads with missing or empty fields. Content is otherwise
    /// passed through untouched, whitespace included.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            BroadcastPayload::Text(p) if p.body.is_empty() => Err(AppError::Validation(
                "Message content is required".to_string(),
            )),
            BroadcastPayload::Email(p) if p.subject.is_empty() || p.body.is_empty() => {
                Err(AppError::Validation(
                    "Subject and message content are required".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// A user resolved to a deliverable addressee on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Uuid,
    /// Phone number (normalized) or email address
    pub addressee: String,
}

/// Result of a single send within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent(Recipient),
    Failed(Recipient, String),
}

/// A recipient that could not be reached, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub user_id: Uuid,
    pub addressee: String,
    pub reason: String,
}

/// Aggregate result of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl BatchSummary {
    /// Fold per-recipient outcomes, keeping failures in the order given.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = DispatchOutcome>) -> Self {
        let mut summary = BatchSummary::default();
        for outcome in outcomes {
            summary.attempted += 1;
            match outcome {
                DispatchOutcome::Sent(_) => summary.succeeded += 1,
                DispatchOutcome::Failed(recipient, reason) => {
                    summary.failed += 1;
                    summary.failures.push(DeliveryFailure {
                        user_id: recipient.user_id,
                        addressee: recipient.addressee,
                        reason,
                    });
                }
            }
        }
        summary
    }
}
