//! Chat Channel Interface
//!
//! Defines the collaborator interface the voting engine posts through,
//! plus the Block Kit-shaped message blocks both sides exchange. The
//! Slack implementation lives in [`slack`].

pub mod slack;

use crate::polls::types::MessageRef;
use async_trait::async_trait;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur in channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for posting and updating rendered messages in a chat channel.
///
/// The engine only needs these two calls; everything else about the
/// platform (events, commands, auth) lives outside this crate.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post a new message; returns a reference usable for later updates.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        blocks: &[MessageBlock],
    ) -> ChannelResult<MessageRef>;

    /// Update a previously posted message in place.
    async fn update_message(
        &self,
        message: &MessageRef,
        text: &str,
        blocks: &[MessageBlock],
    ) -> ChannelResult<()>;
}

/// A Block Kit-shaped message block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBlock {
    kind: String,
    text: Option<String>,
    context_text: Option<String>,
    accessory: Option<BlockButton>,
}

/// A button accessory attached to a section block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockButton {
    label: String,
    action_id: String,
    value: String,
}

impl MessageBlock {
    /// Create a mrkdwn section block.
    pub fn section(text: &str) -> Self {
        Self {
            kind: "section".to_string(),
            text: Some(text.to_string()),
            context_text: None,
            accessory: None,
        }
    }

    /// Create a section block with a button accessory.
    pub fn section_with_button(text: &str, label: &str, action_id: &str, value: &str) -> Self {
        Self {
            kind: "section".to_string(),
            text: Some(text.to_string()),
            context_text: None,
            accessory: Some(BlockButton {
                label: label.to_string(),
                action_id: action_id.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Create a divider block.
    pub fn divider() -> Self {
        Self {
            kind: "divider".to_string(),
            text: None,
            context_text: None,
            accessory: None,
        }
    }

    /// Create a context block with a single mrkdwn element.
    pub fn context(text: &str) -> Self {
        Self {
            kind: "context".to_string(),
            text: None,
            context_text: Some(text.to_string()),
            accessory: None,
        }
    }

    /// Serialize into the Block Kit wire shape.
    pub fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "type": self.kind,
        });

        if let Some(text) = &self.text {
            json["text"] = serde_json::json!({
                "type": "mrkdwn",
                "text": text,
            });
        }

        if let Some(text) = &self.context_text {
            json["elements"] = serde_json::json!([{
                "type": "mrkdwn",
                "text": text,
            }]);
        }

        if let Some(button) = &self.accessory {
            json["accessory"] = serde_json::json!({
                "type": "button",
                "text": {
                    "type": "plain_text",
                    "text": button.label,
                },
                "action_id": button.action_id,
                "value": button.value,
            });
        }

        json
    }
}

/// Serialize a slice of blocks into the wire payload.
pub fn blocks_to_json(blocks: &[MessageBlock]) -> serde_json::Value {
    serde_json::Value::Array(blocks.iter().map(|b| b.to_json()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_json_shape() {
        let json = MessageBlock::section("hello").to_json();
        assert_eq!(json["type"], "section");
        assert_eq!(json["text"]["type"], "mrkdwn");
        assert_eq!(json["text"]["text"], "hello");
        assert!(json.get("accessory").is_none());
    }

    #[test]
    fn test_button_json_shape() {
        let json = MessageBlock::section_with_button("opt", "Vote", "poll_vote_0", "vote_p1_0")
            .to_json();
        assert_eq!(json["accessory"]["type"], "button");
        assert_eq!(json["accessory"]["action_id"], "poll_vote_0");
        assert_eq!(json["accessory"]["value"], "vote_p1_0");
        assert_eq!(json["accessory"]["text"]["text"], "Vote");
    }

    #[test]
    fn test_divider_and_context() {
        let divider = MessageBlock::divider().to_json();
        assert_eq!(divider["type"], "divider");
        assert!(divider.get("text").is_none());

        let context = MessageBlock::context("footer").to_json();
        assert_eq!(context["type"], "context");
        assert_eq!(context["elements"][0]["text"], "footer");
    }

    #[test]
    fn test_blocks_to_json_is_array() {
        let json = blocks_to_json(&[MessageBlock::divider(), MessageBlock::section("x")]);
        assert_eq!(json.as_array().unwrap().len(), 2);
    }
}
