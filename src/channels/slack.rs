//! Slack Channel Implementation
//!
//! Posts and updates poll messages via the Slack Web API
//! (`chat.postMessage` / `chat.update`).

use super::{blocks_to_json, ChannelError, ChatClient, MessageBlock};
use crate::polls::types::MessageRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Slack channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Bot token from Slack App (xoxb-...)
    #[serde(default)]
    pub bot_token: String,
    /// Optional channel to post a startup notice to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_channel: Option<String>,
}

/// Slack Web API client
#[derive(Debug)]
pub struct SlackChannel {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a new Slack channel
    pub fn new(config: SlackConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to build reqwest client");

        Self { config, client }
    }

    /// Get the API base URL
    fn api_url(&self, method: &str) -> String {
        format!("https://slack.com/api/{}", method)
    }

    /// Send a request to the Slack API and return the response envelope.
    async fn api_request(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ChannelError> {
        let response = self
            .client
            .post(self.api_url(method))
            .header("Authorization", format!("Bearer {}", self.config.bot_token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.to_string()))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChannelError::Parse(e.to_string()))?;

        if json.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error_msg = json
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");
            return Err(ChannelError::Api(error_msg.to_string()));
        }

        Ok(json)
    }

    /// Verify the bot token against `auth.test`.
    pub async fn connect(&self) -> Result<(), ChannelError> {
        info!("Connecting to Slack...");
        self.api_request("auth.test", serde_json::json!({})).await?;
        info!("Slack connected successfully");
        Ok(())
    }
}

#[async_trait]
impl ChatClient for SlackChannel {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        blocks: &[MessageBlock],
    ) -> Result<MessageRef, ChannelError> {
        let mut body = serde_json::json!({
            "channel": channel,
            "text": text,
        });
        if !blocks.is_empty() {
            body["blocks"] = blocks_to_json(blocks);
        }

        let json = self.api_request("chat.postMessage", body).await?;

        let ts = json
            .get("ts")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChannelError::Parse("missing ts in response".to_string()))?;
        let channel = json
            .get("channel")
            .and_then(|v| v.as_str())
            .unwrap_or(channel);

        Ok(MessageRef {
            channel: channel.to_string(),
            ts: ts.to_string(),
        })
    }

    async fn update_message(
        &self,
        message: &MessageRef,
        text: &str,
        blocks: &[MessageBlock],
    ) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({
            "channel": message.channel,
            "ts": message.ts,
            "text": text,
        });
        if !blocks.is_empty() {
            body["blocks"] = blocks_to_json(blocks);
        }

        self.api_request("chat.update", body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let channel = SlackChannel::new(SlackConfig::default());
        assert_eq!(
            channel.api_url("chat.postMessage"),
            "https://slack.com/api/chat.postMessage"
        );
    }

    #[test]
    fn test_config_parses_camel_case() {
        let config: SlackConfig =
            serde_json::from_str(r#"{"botToken": "xoxb-1", "startupChannel": "C42"}"#).unwrap();
        assert_eq!(config.bot_token, "xoxb-1");
        assert_eq!(config.startup_channel.as_deref(), Some("C42"));
    }
}
