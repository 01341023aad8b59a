//! Model client trait for abstracting the model service
//!
//! The orchestrator only sees this boundary; tests swap in scripted clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{ContentBlock, Message, Result, StopReason, ToolDefinition};

/// One request to the model service
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

/// Token usage reported for a single response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Response from the model service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub usage: Usage,
}

impl ModelResponse {
    /// Whether the model is waiting on tool results
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == Some(StopReason::ToolUse)
    }

    /// First text block of the response
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Content converted into history blocks, dropping unsupported ones
    pub fn history_blocks(&self) -> Vec<ContentBlock> {
        self.content
            .iter()
            .filter(|block| !matches!(block, ContentBlock::Unsupported))
            .cloned()
            .collect()
    }
}

/// Trait for model service clients
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the conversation and wait for the complete response
    async fn create_message(&self, request: &MessageRequest<'_>) -> Result<ModelResponse>;

    /// Get the client name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_parsing() {
        let response: ModelResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                {"type": "text", "text": "Creating the file."},
                {"type": "tool_use", "id": "toolu_1", "name": "str_replace_editor",
                 "input": {"command": "create", "path": "/repo/hello.txt", "file_text": "hi"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 45}
        }))
        .unwrap();

        assert!(response.wants_tools());
        assert_eq!(response.first_text(), Some("Creating the file."));
        assert_eq!(response.usage.input_tokens, 120);
        assert_eq!(response.usage.output_tokens, 45);
        assert_eq!(response.history_blocks().len(), 2);
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let messages = vec![Message::user("Hello")];
        let request = MessageRequest {
            model: "m",
            max_tokens: 16,
            system: None,
            messages: &messages,
            tools: &[],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("system").is_none());
        assert!(value.get("tools").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"][0]["text"], "Hello");
    }

    #[test]
    fn test_history_blocks_drop_unsupported() {
        let response: ModelResponse = serde_json::from_value(json!({
            "content": [
                {"type": "redacted_thinking", "data": "..."},
                {"type": "text", "text": "ok"}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert!(!response.wants_tools());
        assert_eq!(response.history_blocks(), vec![ContentBlock::text("ok")]);
    }
}
