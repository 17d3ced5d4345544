//! # VK Service Adapter
//!
//! Implements [`UpdateSource`] and [`OutboundChat`] for the VK group API:
//! long-poll session acquisition (`groups.getLongPollServer`), the held-open
//! `a_check` fetch, and `messages.send` with an optional keyboard. This module
//! is the only place that knows the VK wire formats.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::config::VkConfig;
use crate::domain::error::BotError;
use crate::domain::traits::{OutboundChat, UpdateSource};
use crate::domain::types::{InboundEvent, LongPollCursor, PollOutcome, Reply};

const API_BASE: &str = "https://api.vk.com/method";

/// VK error codes that point at broken credentials rather than a bad moment.
const AUTH_ERROR_CODES: &[i64] = &[5, 27, 28];

pub struct VkClient {
    http: reqwest::Client,
    config: VkConfig,
}

impl VkClient {
    pub fn new(config: VkConfig) -> Self {
        // The client timeout must outlive the server-side long-poll hold.
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.poll_wait + 10))
            .build()
            .expect("failed to create HTTP client");
        Self { http, config }
    }
}

#[async_trait]
impl UpdateSource for VkClient {
    async fn acquire(&self) -> Result<LongPollCursor, BotError> {
        let response = self
            .http
            .get(format!("{API_BASE}/groups.getLongPollServer"))
            .query(&[
                ("group_id", self.config.group_id.as_str()),
                ("access_token", self.config.access_token.as_str()),
                ("v", self.config.api_version.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BotError::Transient(format!("getLongPollServer request failed: {e}")))?;

        let envelope: ApiEnvelope<LongPollServer> = response
            .json()
            .await
            .map_err(|e| BotError::Transient(format!("getLongPollServer parse failed: {e}")))?;

        if let Some(error) = envelope.error {
            if AUTH_ERROR_CODES.contains(&error.error_code) {
                return Err(BotError::Configuration(format!(
                    "vk rejected the credentials: [{}] {}",
                    error.error_code, error.error_msg
                )));
            }
            return Err(BotError::Transient(format!(
                "getLongPollServer error: [{}] {}",
                error.error_code, error.error_msg
            )));
        }

        let server = envelope.response.ok_or_else(|| {
            BotError::Transient("getLongPollServer returned an empty response".to_string())
        })?;

        Ok(LongPollCursor {
            server: server.server,
            key: server.key,
            ts: server.ts,
        })
    }

    async fn fetch(&self, cursor: &LongPollCursor) -> Result<PollOutcome, BotError> {
        let wait = self.config.poll_wait.to_string();
        let response = self
            .http
            .get(&cursor.server)
            .query(&[
                ("act", "a_check"),
                ("key", cursor.key.as_str()),
                ("ts", cursor.ts.as_str()),
                ("wait", wait.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BotError::Transient(format!("long-poll fetch failed: {e}")))?;

        let poll: PollResponse = response
            .json()
            .await
            .map_err(|e| BotError::Transient(format!("long-poll body unparseable: {e}")))?;

        // An error-bearing response must not be looped on with a stale
        // cursor: failed=1 ships a fresh ts, anything else voids the key.
        if let Some(failed) = poll.failed {
            return match (failed, poll.ts) {
                (1, Some(ts)) => Ok(PollOutcome::Resync { ts }),
                _ => Err(BotError::Session(format!(
                    "long-poll responded with failed={failed}"
                ))),
            };
        }

        let ts = poll
            .ts
            .ok_or_else(|| BotError::Transient("long-poll response missing ts".to_string()))?;
        let events = poll
            .updates
            .unwrap_or_default()
            .into_iter()
            .filter_map(parse_update)
            .collect();

        Ok(PollOutcome::Batch { ts, events })
    }
}

#[async_trait]
impl OutboundChat for VkClient {
    async fn send(&self, user_id: i64, reply: &Reply) -> Result<(), BotError> {
        let random_id = rand::random::<u32>();
        let mut query: Vec<(&str, String)> = vec![
            ("user_id", user_id.to_string()),
            ("random_id", random_id.to_string()),
            ("message", reply.text.clone()),
            ("access_token", self.config.access_token.clone()),
            ("v", self.config.api_version.clone()),
        ];
        if let Some(keyboard) = &reply.keyboard {
            let json = serde_json::to_string(keyboard)
                .map_err(|e| BotError::Vk(format!("keyboard serialization failed: {e}")))?;
            query.push(("keyboard", json));
        }

        let response = self
            .http
            .get(format!("{API_BASE}/messages.send"))
            .query(&query)
            .send()
            .await
            .map_err(|e| BotError::Vk(format!("messages.send failed: {e}")))?;

        // The body is not inspected, only logged for diagnostics.
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(user_id, %body, "messages.send response");
        Ok(())
    }
}

/// Maps one raw update into a domain event; unknown update types are ignored.
fn parse_update(update: RawUpdate) -> Option<InboundEvent> {
    let object = update.object?;
    match update.kind.as_str() {
        "message_allow" => object
            .user_id
            .map(|user_id| InboundEvent::MessageAllowed { user_id }),
        "message_new" => object.message.map(|message| InboundEvent::NewMessage {
            from_id: message.from_id,
            text: message.text.unwrap_or_default(),
        }),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    response: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct LongPollServer {
    server: String,
    key: String,
    ts: String,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    ts: Option<String>,
    updates: Option<Vec<RawUpdate>>,
    failed: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    #[serde(rename = "type")]
    kind: String,
    object: Option<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    user_id: Option<i64>,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    from_id: i64,
    text: Option<String>,
}
