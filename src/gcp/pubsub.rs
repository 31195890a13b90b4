//! Pull-based Pub/Sub client for the reconciler.
//!
//! Message data arrives base64-encoded; attributes carry the event type.
//! Negative acknowledgement is expressed by resetting the ack deadline
//! to zero, which makes the message immediately redeliverable.

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

const DEFAULT_BASE_URL: &str = "https://pubsub.googleapis.com";
const EMULATOR_ENV: &str = "PUBSUB_EMULATOR_HOST";

/// One pulled message, ready for the reconciler.
#[derive(Debug)]
pub struct PulledMessage {
    pub ack_id: String,
    pub attributes: HashMap<String, String>,
    pub data: Vec<u8>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<ReceivedMessage>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ReceivedMessage {
    ack_id: String,
    message: PubSubMessage,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PubSubMessage {
    #[serde(default)]
    data: String,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

impl ReceivedMessage {
    fn into_pulled(self) -> PulledMessage {
        PulledMessage {
            ack_id: self.ack_id,
            attributes: self.message.attributes,
            // A botched encoding surfaces downstream as a malformed
            // payload and gets nacked there.
            data: general_purpose::STANDARD
                .decode(&self.message.data)
                .unwrap_or_default(),
        }
    }
}

/// Client bound to one subscription.
pub struct PubSubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    subscription: String,
}

impl PubSubClient {
    /// Build a client against `PUBSUB_EMULATOR_HOST` when set, the
    /// public endpoint otherwise.
    pub fn from_env(project_id: &str, subscription_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: super::base_url(EMULATOR_ENV, DEFAULT_BASE_URL),
            token: super::bearer_token(),
            subscription: format!("projects/{project_id}/subscriptions/{subscription_id}"),
        }
    }

    fn post(&self, action: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/{}:{action}", self.base_url, self.subscription);
        let mut request = self.http.post(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Pull up to `max_messages` undelivered messages.
    pub async fn pull(&self, max_messages: usize) -> Result<Vec<PulledMessage>, reqwest::Error> {
        let response: PullResponse = self
            .post("pull")
            .json(&json!({ "maxMessages": max_messages }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .received_messages
            .into_iter()
            .map(ReceivedMessage::into_pulled)
            .collect())
    }

    /// Positively acknowledge processed messages.
    pub async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), reqwest::Error> {
        if ack_ids.is_empty() {
            return Ok(());
        }
        self.post("acknowledge")
            .json(&json!({ "ackIds": ack_ids }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Negatively acknowledge: zero the ack deadline so the messages
    /// redeliver immediately.
    pub async fn nack(&self, ack_ids: &[String]) -> Result<(), reqwest::Error> {
        if ack_ids.is_empty() {
            return Ok(());
        }
        self.post("modifyAckDeadline")
            .json(&json!({ "ackIds": ack_ids, "ackDeadlineSeconds": 0 }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulled_messages_decode_base64_data() {
        let response: PullResponse = serde_json::from_str(
            r#"{
                "receivedMessages": [{
                    "ackId": "ack-1",
                    "message": {
                        "data": "eyJOYW1lIjoiZmlsZSJ9",
                        "attributes": { "eventType": "OBJECT_FINALIZE" },
                        "messageId": "1"
                    }
                }]
            }"#,
        )
        .unwrap();

        let pulled: Vec<PulledMessage> = response
            .received_messages
            .into_iter()
            .map(ReceivedMessage::into_pulled)
            .collect();
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].ack_id, "ack-1");
        assert_eq!(pulled[0].data, br#"{"Name":"file"}"#);
        assert_eq!(
            pulled[0].attributes.get("eventType").map(String::as_str),
            Some("OBJECT_FINALIZE")
        );
    }

    #[test]
    fn empty_pull_response_decodes() {
        let response: PullResponse = serde_json::from_str("{}").unwrap();
        assert!(response.received_messages.is_empty());
    }
}
