use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{Notifier, NotifyError, PushMessage};

/// Sends push messages through the Expo push service.
#[derive(Clone)]
pub struct ExpoNotifier {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    #[serde(default)]
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    message: Option<String>,
}

impl ExpoNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            access_token,
        })
    }
}

/// Expo addresses look like `ExponentPushToken[...]` or `ExpoPushToken[...]`.
pub fn is_expo_push_token(token: &str) -> bool {
    ["ExponentPushToken[", "ExpoPushToken["].iter().any(|prefix| {
        token
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(']'))
            .is_some_and(|inner| !inner.is_empty())
    })
}

#[async_trait]
impl Notifier for ExpoNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), NotifyError> {
        if !is_expo_push_token(&message.to) {
            return Err(NotifyError::InvalidAddress(message.to.clone()));
        }

        let payload = serde_json::json!([{
            "to": message.to,
            "sound": "default",
            "title": message.title,
            "body": message.body,
            "data": message.data,
        }]);

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response: ExpoResponse = request.send().await?.error_for_status()?.json().await?;
        match response.data.into_iter().find(|ticket| ticket.status != "ok") {
            Some(ticket) => Err(NotifyError::Rejected(
                ticket.message.unwrap_or(ticket.status),
            )),
            None => Ok(()),
        }
    }
}
