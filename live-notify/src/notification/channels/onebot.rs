//! OneBot-style bot HTTP API channel.
//!
//! Sends group messages via `POST <base_url>/send_msg` with a bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notification::events::MessageSegment;
use crate::utils::url::join_endpoint;
use crate::{Error, Result};

const SEND_MSG_PATH: &str = "/send_msg";

/// OneBot channel configuration.
#[derive(Debug, Clone)]
pub struct OneBotConfig {
    /// Base URL of the bot HTTP API.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header.
    pub token: String,
}

/// Optional JSON envelope returned by OneBot implementations.
#[derive(Debug, Deserialize)]
struct SendMsgReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    retcode: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    wording: Option<String>,
}

impl SendMsgReply {
    fn failure(&self) -> Option<String> {
        let failed_status = self.status.as_deref() == Some("failed");
        let failed_code = self.retcode.is_some_and(|code| code != 0);
        if !failed_status && !failed_code {
            return None;
        }
        let reason = self
            .wording
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("no reason given");
        Some(format!(
            "bot rejected message (retcode {}): {}",
            self.retcode.unwrap_or_default(),
            reason
        ))
    }
}

/// OneBot notification channel.
pub struct OneBotChannel {
    endpoint: String,
    token: String,
    client: Client,
}

impl OneBotChannel {
    /// Create a new OneBot channel sharing `client`.
    pub fn new(config: OneBotConfig, client: Client) -> Self {
        let endpoint = join_endpoint(&config.base_url, SEND_MSG_PATH);
        debug!(endpoint = %endpoint, "OneBot channel configured");
        Self {
            endpoint,
            token: config.token,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the JSON payload.
    fn build_payload(group_id: &str, message: &[MessageSegment]) -> serde_json::Value {
        json!({
            "group_id": group_id,
            "message": message,
        })
    }
}

#[async_trait]
impl NotificationChannel for OneBotChannel {
    fn channel_type(&self) -> &'static str {
        "onebot"
    }

    async fn send(&self, group_id: &str, message: &[MessageSegment]) -> Result<()> {
        let payload = Self::build_payload(group_id, message);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::dispatch(group_id, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(group_id, "send_msg failed: {} - {}", status, body);
            return Err(Error::dispatch(
                group_id,
                format!("HTTP {} - {}", status, body),
            ));
        }

        // Implementations without a JSON envelope are treated as accepted.
        if let Ok(reply) = serde_json::from_str::<SendMsgReply>(&body)
            && let Some(reason) = reply.failure()
        {
            return Err(Error::dispatch(group_id, reason));
        }

        debug!(group_id, "send_msg accepted");
        Ok(())
    }
}
