use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};

use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;

/// Convert internal Message format to OpenAI's API message specification.
/// Tool responses become separate `role: tool` entries keyed by the
/// originating call id, following the wire format.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.text.is_empty() {
                        converted["content"] = json!(text.text);
                    }
                }
                MessageContent::ToolRequest(request) => {
                    let sanitized_name = sanitize_function_name(&request.tool_name);
                    let tool_calls = converted
                        .as_object_mut()
                        .unwrap()
                        .entry("tool_calls")
                        .or_insert(json!([]));

                    tool_calls.as_array_mut().unwrap().push(json!({
                        "id": request.id,
                        "type": "function",
                        "function": {
                            "name": sanitized_name,
                            "arguments": request.arguments.to_string(),
                        }
                    }));
                }
                MessageContent::ToolResponse(response) => {
                    let tool_call_id = response
                        .origin
                        .as_ref()
                        .and_then(|origin| origin.id.clone())
                        .unwrap_or_default();

                    output.push(json!({
                        "role": "tool",
                        "content": result_text(&response.result),
                        "tool_call_id": tool_call_id
                    }));
                }
            }
        }

        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

// String payloads go over the wire verbatim; anything structured is
// JSON-encoded.
fn result_text(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format. Malformed
/// tool calls are kept as requests with their raw pieces; dispatch
/// rejects them and the model reads the error from the tool result.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = &response["choices"][0]["message"];
    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(Value::as_str) {
        message = message.with_text(text);
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(Value::as_array) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments_raw = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();

            if !is_valid_function_name(&function_name) {
                tracing::warn!(name = %function_name, "model produced an invalid function name");
            }

            let arguments = match serde_json::from_str::<Value>(&arguments_raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "tool call arguments were not valid JSON");
                    Value::String(arguments_raw)
                }
            };

            message = message.with_tool_request(id, function_name, arguments);
        }
    }

    Ok(message)
}

pub fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

pub fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::ToolOrigin;
    use serde_json::json;

    const OPENAI_TOOL_USE_RESPONSE: &str = r#"{
        "choices": [{
            "role": "assistant",
            "message": {
                "tool_calls": [{
                    "id": "1",
                    "function": {
                        "name": "rag_tool",
                        "arguments": "{\"query\": \"net sales 2022\"}"
                    }
                }]
            }
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 25,
            "total_tokens": 35
        }
    }"#;

    #[test]
    fn test_messages_to_openai_spec() {
        let message = Message::user().with_text("Hello");
        let spec = messages_to_openai_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_spec_complex() {
        let messages = vec![
            Message::assistant().with_text("Hello!"),
            Message::user().with_text("What were Amazon's net sales in 2022?"),
            Message::assistant().with_tool_request(
                "call_1",
                "rag_tool",
                json!({"query": "net sales 2022"}),
            ),
            Message::tool().with_tool_response(
                json!(["chunk one", "chunk two"]),
                Some(ToolOrigin::new("rag_tool").with_id("call_1")),
            ),
        ];

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 4);
        assert_eq!(spec[0]["role"], "assistant");
        assert_eq!(spec[0]["content"], "Hello!");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[2]["role"], "assistant");
        assert!(spec[2]["tool_calls"].is_array());
        assert_eq!(spec[2]["tool_calls"][0]["function"]["name"], "rag_tool");
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(spec[3]["tool_call_id"], "call_1");
        assert_eq!(spec[3]["content"], "[\"chunk one\",\"chunk two\"]");
    }

    #[test]
    fn test_string_tool_results_pass_verbatim() {
        let messages = vec![Message::tool().with_tool_response(
            json!("Rate limit reached. Please try again later."),
            Some(ToolOrigin::new("web_search").with_id("call_2")),
        )];

        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec[0]["content"], "Rate limit reached. Please try again later.");
    }

    #[test]
    fn test_tools_to_openai_spec() {
        let tool = Tool::new(
            "rag_tool",
            "Retrieve grounded context",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The retrieval query"
                    }
                },
                "required": ["query"]
            }),
        );

        let spec = tools_to_openai_spec(&[tool]).unwrap();

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "rag_tool");
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let parameters = json!({"type": "object", "properties": {}});
        let tool1 = Tool::new("rag_tool", "first", parameters.clone());
        let tool2 = Tool::new("rag_tool", "second", parameters);

        let result = tools_to_openai_spec(&[tool1, tool2]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate tool name"));
    }

    #[test]
    fn test_tools_to_openai_spec_empty() {
        assert!(tools_to_openai_spec(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("hello-world"), "hello-world");
        assert_eq!(sanitize_function_name("hello world"), "hello_world");
        assert_eq!(sanitize_function_name("hello@world"), "hello_world");
    }

    #[test]
    fn test_is_valid_function_name() {
        assert!(is_valid_function_name("rag_tool"));
        assert!(is_valid_function_name("web-search"));
        assert!(!is_valid_function_name("rag tool"));
        assert!(!is_valid_function_name("rag@tool"));
    }

    #[test]
    fn test_openai_response_to_message_text() {
        let response = json!({
            "choices": [{
                "role": "assistant",
                "message": {
                    "content": "Net sales were $514B in 2022."
                }
            }]
        });

        let message = openai_response_to_message(&response).unwrap();
        assert_eq!(message.content.len(), 1);
        assert_eq!(message.content[0].as_text(), Some("Net sales were $514B in 2022."));
    }

    #[test]
    fn test_openai_response_to_message_tool_request() {
        let response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE).unwrap();
        let message = openai_response_to_message(&response).unwrap();

        assert_eq!(message.content.len(), 1);
        let request = message.content[0].as_tool_request().unwrap();
        assert_eq!(request.id, "1");
        assert_eq!(request.tool_name, "rag_tool");
        assert_eq!(request.arguments, json!({"query": "net sales 2022"}));
    }

    #[test]
    fn test_openai_response_to_message_invalid_arguments() {
        let mut response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE).unwrap();
        response["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"] =
            json!("invalid json {");

        let message = openai_response_to_message(&response).unwrap();
        let request = message.content[0].as_tool_request().unwrap();
        // the raw string is preserved so dispatch can reject it visibly
        assert_eq!(request.arguments, json!("invalid json {"));
    }

    #[test]
    fn test_check_openai_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This message is too long"
        });

        let result = check_openai_context_length_error(&error);
        assert_eq!(
            result.unwrap().to_string(),
            "Context length exceeded. Message: This message is too long"
        );

        let error = json!({
            "code": "other_error",
            "message": "Some other error"
        });
        assert!(check_openai_context_length_error(&error).is_none());
    }
}
