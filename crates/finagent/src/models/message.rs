use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;
use super::tool::ToolCall;

/// Plain text spoken by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// A model's request to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolRequest {
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall::new(&self.tool_name, self.arguments.clone())
    }
}

/// The tool invocation that produced a result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOrigin {
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolOrigin {
    pub fn new<N: Into<String>>(tool_name: N) -> Self {
        ToolOrigin {
            tool_name: tool_name.into(),
            id: None,
        }
    }

    pub fn with_id<I: Into<String>>(mut self, id: I) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The payload a tool invocation returned. The payload is whatever the
/// tool handed back: structured JSON, a stringified literal, or prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ToolOrigin>,
}

/// Content passed inside a message. Upstream transcripts do not carry a
/// reliable type tag, so items are classified by which distinguishing
/// field is present: `text`, `tool_name`, or `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(TextContent),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn tool_request<I, N>(id: I, tool_name: N, arguments: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        MessageContent::ToolRequest(ToolRequest {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        })
    }

    pub fn tool_response(result: Value, origin: Option<ToolOrigin>) -> Self {
        MessageContent::ToolResponse(ToolResponse { result, origin })
    }

    /// Get the text if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        if let MessageContent::ToolRequest(ref tool_request) = self {
            Some(tool_request)
        } else {
            None
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        if let MessageContent::ToolResponse(ref tool_response) = self {
            Some(tool_response)
        } else {
            None
        }
    }
}

/// Token accounting reported by the hosted model for one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        prompt_tokens: Option<i32>,
        completion_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// Optional per-message metadata recorded from the model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// A message to or from an LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMetadata>,
}

impl Message {
    fn with_role(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
            meta: None,
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system() -> Self {
        Self::with_role(Role::System)
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::with_role(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::with_role(Role::Assistant)
    }

    /// Create a new tool message with the current timestamp
    pub fn tool() -> Self {
        Self::with_role(Role::Tool)
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add a tool request to the message
    pub fn with_tool_request<I, N>(self, id: I, tool_name: N, arguments: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        self.with_content(MessageContent::tool_request(id, tool_name, arguments))
    }

    /// Add a tool response to the message
    pub fn with_tool_response(self, result: Value, origin: Option<ToolOrigin>) -> Self {
        self.with_content(MessageContent::tool_response(result, origin))
    }

    /// Attach response metadata to the message
    pub fn with_meta(mut self, meta: MessageMetadata) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Concatenated text content, for display and answer scoring
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| content.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ordered record of all messages exchanged in one agent interaction.
/// Produced by the agent runtime, consumed read-only by the extraction
/// layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Box<Message>>,
}

impl Transcript {
    pub fn new(messages: Vec<Message>) -> Self {
        Transcript {
            messages,
            last_message: None,
        }
    }

    /// Ingest an externally-produced transcript value. A mapping without
    /// a `messages` key parses as an empty transcript.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
