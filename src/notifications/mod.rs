//! Push notifications for booking changes.
//!
//! Delivery is fire-and-forget: after a booking change commits, a task is
//! spawned that looks up the recipients' push addresses and sends one message
//! to each. Every attempt ends in a [`DeliveryOutcome`] that is logged. Nothing
//! is retried and no failure ever reaches the request that triggered it.

mod expo;

pub use expo::{ExpoNotifier, is_expo_push_token};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::DbPool;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid push address: {0}")]
    InvalidAddress(String),

    #[error("push transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("push rejected: {0}")]
    Rejected(String),
}

/// Delivers a single push message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    Client,
    Owner,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent,
    /// The recipient never registered a push address.
    NoAddress,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub recipient: Recipient,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Created,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct BookingNotice {
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub business_id: Uuid,
    pub event: BookingEvent,
}

#[derive(Debug, sqlx::FromRow)]
struct RecipientRow {
    business_name: String,
    client_token: Option<String>,
    owner_token: Option<String>,
}

/// Build the client and owner messages for a booking event.
pub fn booking_messages(
    notice: &BookingNotice,
    business_name: &str,
    client_token: Option<String>,
    owner_token: Option<String>,
) -> Vec<(Recipient, Option<PushMessage>)> {
    let (client_title, client_body, owner_title, owner_body) = match notice.event {
        BookingEvent::Created => (
            "Booking confirmed",
            format!("Your booking at {business_name} is confirmed."),
            "New booking",
            format!("You have a new booking at {business_name}."),
        ),
        BookingEvent::Cancelled => (
            "Booking cancelled",
            format!("Your booking at {business_name} was cancelled."),
            "Booking cancelled",
            format!("A booking at {business_name} was cancelled."),
        ),
    };
    let data = serde_json::json!({ "booking_id": notice.booking_id });

    let message = |to: String, title: &str, body: String| PushMessage {
        to,
        title: title.to_string(),
        body,
        data: data.clone(),
    };

    vec![
        (
            Recipient::Client,
            client_token.map(|to| message(to, client_title, client_body)),
        ),
        (
            Recipient::Owner,
            owner_token.map(|to| message(to, owner_title, owner_body)),
        ),
    ]
}

/// Send each message independently; one failure never stops the others.
pub async fn deliver_best_effort(
    notifier: &dyn Notifier,
    messages: Vec<(Recipient, Option<PushMessage>)>,
) -> Vec<DeliveryOutcome> {
    let mut outcomes = Vec::with_capacity(messages.len());
    for (recipient, message) in messages {
        let delivery = match message {
            None => Delivery::NoAddress,
            Some(message) => match notifier.send(&message).await {
                Ok(()) => Delivery::Sent,
                Err(err) => Delivery::Failed(err.to_string()),
            },
        };
        match &delivery {
            Delivery::Sent => tracing::info!(?recipient, "push notification sent"),
            Delivery::NoAddress => tracing::debug!(?recipient, "no push address registered"),
            Delivery::Failed(reason) => {
                tracing::warn!(?recipient, reason = %reason, "push notification failed")
            }
        }
        outcomes.push(DeliveryOutcome {
            recipient,
            delivery,
        });
    }
    outcomes
}

/// Spawn the notifications for a committed booking change.
///
/// The returned handle is only awaited by tests; request handlers drop it.
pub fn spawn_booking_notices(
    pool: DbPool,
    notifier: Arc<dyn Notifier>,
    notice: BookingNotice,
) -> JoinHandle<Vec<DeliveryOutcome>> {
    tokio::spawn(async move {
        let row = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT bp.name AS business_name,
                   client.push_token AS client_token,
                   owner.push_token AS owner_token
            FROM business_profiles bp
            JOIN users owner ON owner.id = bp.user_id
            LEFT JOIN users client ON client.id = $2
            WHERE bp.id = $1
            "#,
        )
        .bind(notice.business_id)
        .bind(notice.client_id)
        .fetch_optional(&pool)
        .await;

        let row = match row {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::warn!(
                    booking_id = %notice.booking_id,
                    "business vanished before notifying"
                );
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(
                    booking_id = %notice.booking_id,
                    error = %err,
                    "push recipient lookup failed"
                );
                return Vec::new();
            }
        };

        let messages = booking_messages(
            &notice,
            &row.business_name,
            row.client_token,
            row.owner_token,
        );
        deliver_best_effort(notifier.as_ref(), messages).await
    })
}
