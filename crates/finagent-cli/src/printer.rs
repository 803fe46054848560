use console::style;
use serde_json::Value;

use finagent::models::message::{Message, MessageContent, MessageMetadata, Transcript};
use finagent::models::role::Role;

const RESULT_TRUNCATE_AT: usize = 500;

/// Pretty printer for chat transcripts: role-colored headers, response
/// metadata, model thoughts, tool calls and truncated tool results.
pub struct ChatMessagePrinter;

impl ChatMessagePrinter {
    pub fn new() -> Self {
        ChatMessagePrinter
    }

    pub fn print_transcript(&self, transcript: &Transcript) {
        println!("{}\n", style("=== CHAT CONVERSATION ===").bold());

        for (i, message) in transcript.messages.iter().enumerate() {
            self.print_message(message, i + 1);
            println!();
        }

        if let Some(last) = &transcript.last_message {
            if !transcript.messages.iter().any(|m| m == &**last) {
                println!("{}\n", style("=== LAST MESSAGE ===").bold());
                self.print_message(last, transcript.messages.len() + 1);
            }
        }
    }

    pub fn print_message(&self, message: &Message, index: usize) {
        let header = format!("[{}] {}", index, message.role.as_str().to_uppercase());
        let header = match message.role {
            Role::System => style(header).blue(),
            Role::User => style(header).green(),
            Role::Assistant => style(header).yellow(),
            Role::Tool => style(header).magenta(),
        };
        println!("{}", header.bold());

        if let Some(meta) = &message.meta {
            self.print_metadata(meta);
        }
        for item in &message.content {
            self.print_content(item, message.role);
        }
    }

    fn print_metadata(&self, meta: &MessageMetadata) {
        println!("{}", style("Metadata:").dim());

        if let Some(model) = &meta.model {
            println!("  Model: {}", model);
        }
        if let Some(usage) = &meta.usage {
            println!(
                "  Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0)
            );
        }
        if let Some(reason) = &meta.finish_reason {
            println!("  Finish Reason: {}", reason);
        }
        println!();
    }

    fn print_content(&self, item: &MessageContent, role: Role) {
        match item {
            MessageContent::Text(text) => self.print_text(&text.text, role),
            MessageContent::ToolRequest(request) => {
                println!("Tool Call: {}", request.tool_name);
                let arguments = serde_json::to_string_pretty(&request.arguments)
                    .unwrap_or_else(|_| request.arguments.to_string());
                println!("   Arguments: {}", arguments);
                if !request.id.is_empty() {
                    println!("   ID: {}", request.id);
                }
            }
            MessageContent::ToolResponse(response) => {
                println!("Tool Result:");
                let rendered = match &response.result {
                    Value::String(s) => s.clone(),
                    other => serde_json::to_string_pretty(other)
                        .unwrap_or_else(|_| other.to_string()),
                };
                println!("   {}", truncate_result(&rendered));
            }
        }
    }

    fn print_text(&self, text: &str, role: Role) {
        if let Some(rest) = text.strip_prefix("<thinking>") {
            if let Some((thinking, remaining)) = rest.split_once("</thinking>") {
                println!("{}", style("Model Thoughts:").dim());
                println!("{}", style(thinking.trim()).dim());
                let remaining = remaining.trim();
                if !remaining.is_empty() {
                    self.render_text(remaining, role);
                }
                return;
            }
        }
        self.render_text(text, role);
    }

    // Assistant answers render as markdown; everything else prints plain.
    fn render_text(&self, text: &str, role: Role) {
        if role == Role::Assistant {
            bat::PrettyPrinter::new()
                .input_from_bytes(text.as_bytes())
                .language("markdown")
                .print()
                .unwrap();
            println!();
        } else {
            println!("{}", text);
        }
    }
}

fn truncate_result(text: &str) -> String {
    match text.char_indices().nth(RESULT_TRUNCATE_AT) {
        Some((byte_index, _)) => format!("{}... (truncated)", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_result_limits_long_payloads() {
        let long = "x".repeat(600);
        let truncated = truncate_result(&long);
        assert!(truncated.ends_with("... (truncated)"));
        assert_eq!(truncated.len(), RESULT_TRUNCATE_AT + "... (truncated)".len());
    }

    #[test]
    fn test_truncate_result_keeps_short_payloads() {
        assert_eq!(truncate_result("short"), "short");
    }

    #[test]
    fn test_truncate_result_respects_char_boundaries() {
        let long = "é".repeat(600);
        let truncated = truncate_result(&long);
        assert!(truncated.ends_with("... (truncated)"));
        assert!(truncated.starts_with('é'));
    }
}
