//! Shared application state for the Axum API server.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use broadcast_common::config::AppConfig;
use broadcast_notifier::dispatcher::{BroadcastDispatcher, DispatchSettings};
use broadcast_notifier::email::{EmailTransport, ResendSettings};
use broadcast_notifier::phone::PhoneNormalizer;
use broadcast_notifier::sms::{SmsTransport, TwilioSettings};
use broadcast_notifier::source::PgRecipientSource;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<BroadcastDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Wire the production dispatcher: Postgres recipients, Twilio SMS, Resend email.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("broadcast-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let sms = SmsTransport::new(
            client.clone(),
            TwilioSettings {
                api_base: config.twilio_api_base.clone(),
                account_sid: config.twilio_account_sid.clone(),
                auth_token: config.twilio_auth_token.clone(),
                from: config.twilio_phone_number.clone(),
            },
        );
        let email = EmailTransport::new(
            client,
            ResendSettings {
                api_base: config.resend_api_base.clone(),
                api_key: config.resend_api_key.clone(),
                from: config.email_from.clone(),
            },
        );

        let settings = DispatchSettings {
            max_concurrency: config.dispatch_max_concurrency,
            send_timeout: match config.dispatch_send_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        };

        let dispatcher = BroadcastDispatcher::new(
            Arc::new(PgRecipientSource::new(pool)),
            Arc::new(sms),
            Arc::new(email),
            PhoneNormalizer::new(config.default_calling_code.clone()),
            settings,
        )?;

        Ok(Self::new(Arc::new(dispatcher)))
    }
}
