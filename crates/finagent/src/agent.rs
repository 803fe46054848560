use anyhow::Result;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, ToolOrigin, ToolRequest, Transcript};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::Provider;
use crate::systems::System;

/// Default number of provider rounds: one tool call plus one final
/// answer, matching the one-tool-per-turn policy.
pub const DEFAULT_MAX_STEPS: usize = 2;

/// Agent integrates a hosted LLM with the systems it needs to pilot
pub struct Agent {
    systems: Vec<Box<dyn System>>,
    provider: Box<dyn Provider>,
    system_prompt: String,
    max_steps: usize,
}

impl Agent {
    /// Create a new Agent with the specified provider and system prompt
    pub fn new<S: Into<String>>(provider: Box<dyn Provider>, system_prompt: S) -> Self {
        Self {
            systems: Vec::new(),
            provider,
            system_prompt: system_prompt.into(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Add a system to the agent
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Get all tools across systems
    fn get_tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    /// Find the system that serves a tool name
    fn system_for_tool(&self, name: &str) -> Option<&dyn System> {
        self.systems
            .iter()
            .find(|system| system.tools().iter().any(|tool| tool.name == name))
            .map(|system| &**system)
    }

    /// Dispatch a single tool call to the owning system
    async fn dispatch_tool_call(&self, tool_call: ToolCall) -> AgentResult<Value> {
        let system = self
            .system_for_tool(&tool_call.name)
            .ok_or_else(|| AgentError::ToolNotFound(tool_call.name.clone()))?;
        system.call(tool_call).await
    }

    /// Create a stream that yields each message as it's generated by the
    /// agent: the assistant's responses and the tool messages carrying
    /// their results. The round count is bounded by `max_steps`.
    pub async fn reply(&self, messages: &[Message]) -> Result<BoxStream<'_, Result<Message>>> {
        let mut messages = messages.to_vec();
        let tools = self.get_tools();
        let system_prompt = self.system_prompt.clone();
        let max_steps = self.max_steps;

        Ok(Box::pin(async_stream::try_stream! {
            for _ in 0..max_steps {
                let (response, _usage) = self.provider.complete(
                    &system_prompt,
                    &messages,
                    &tools,
                ).await?;

                yield response.clone();

                // Ensure the message above is delivered before the
                // potentially long-running tool calls start.
                tokio::task::yield_now().await;

                let tool_requests: Vec<ToolRequest> = response.content
                    .iter()
                    .filter_map(|content| content.as_tool_request().cloned())
                    .collect();

                if tool_requests.is_empty() {
                    // No more tool calls, end the reply loop
                    break;
                }

                let futures: Vec<_> = tool_requests
                    .iter()
                    .map(|request| self.dispatch_tool_call(request.to_tool_call()))
                    .collect();

                // Run the dispatches in parallel and wait for all of them
                let outputs = futures::future::join_all(futures).await;

                let mut tool_message = Message::tool();
                for (request, output) in tool_requests.iter().zip(outputs.into_iter()) {
                    let origin = ToolOrigin::new(&request.tool_name).with_id(&request.id);
                    let result = match output {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(tool = %request.tool_name, error = %e, "tool dispatch failed");
                            // Shown as result text so the model can interpret the failure
                            Value::String(format!("Error: {}", e))
                        }
                    };
                    tool_message = tool_message.with_tool_response(result, Some(origin));
                }

                yield tool_message.clone();

                messages.push(response);
                messages.push(tool_message);
            }
        }))
    }

    /// Run one interaction to completion and return the full transcript,
    /// input messages included.
    pub async fn run(&self, messages: Vec<Message>) -> Result<Transcript> {
        let mut all = messages.clone();
        let mut stream = self.reply(&messages).await?;
        while let Some(message) = stream.try_next().await? {
            all.push(message);
        }
        Ok(Transcript::new(all))
    }
}
