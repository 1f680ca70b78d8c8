//! Broadcast routes: send one message to every registered user.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use broadcast_common::error::AppError;
use broadcast_common::types::{BatchSummary, BroadcastPayload};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sendSmsToAll", post(send_sms_to_all))
        .route("/sendEmailToAll", post(send_email_to_all))
}

/// Request body for an SMS broadcast.
#[derive(Debug, Deserialize)]
pub struct SmsBroadcastRequest {
    pub message: Option<String>,
}

/// Request body for an email broadcast.
#[derive(Debug, Deserialize)]
pub struct EmailBroadcastRequest {
    pub subject: Option<String>,
    pub text: Option<String>,
}

/// Response for a completed broadcast.
///
/// Per-recipient failures do not change the status code; the counts are
/// informational only.
#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub message: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BroadcastResponse {
    fn new(message: &str, summary: &BatchSummary) -> Self {
        Self {
            message: message.to_string(),
            attempted: summary.attempted,
            succeeded: summary.succeeded,
            failed: summary.failed,
        }
    }
}

/// POST /sendSmsToAll: Text `message` to every user with a phone number.
async fn send_sms_to_all(
    State(state): State<AppState>,
    body: Result<Json<SmsBroadcastRequest>, JsonRejection>,
) -> Result<Json<BroadcastResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let payload = BroadcastPayload::text(req.message.unwrap_or_default());

    let summary = state.dispatcher.dispatch(&payload).await?;
    Ok(Json(BroadcastResponse::new(
        "Messages sent successfully",
        &summary,
    )))
}

/// POST /sendEmailToAll: Email `subject`/`text` to every user with an address.
async fn send_email_to_all(
    State(state): State<AppState>,
    body: Result<Json<EmailBroadcastRequest>, JsonRejection>,
) -> Result<Json<BroadcastResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let payload = BroadcastPayload::email(
        req.subject.unwrap_or_default(),
        req.text.unwrap_or_default(),
    );

    let summary = state.dispatcher.dispatch(&payload).await?;
    Ok(Json(BroadcastResponse::new("Emails sent successfully", &summary)))
}
