//! Completion capability used by the agent loop.

use agent_flow::{AgentTurn, ToolInvocation};
use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{CompletionModel, ToolDefinition};
use rig::providers::openrouter;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::chat_bridge;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("turn history cannot be sent: {0}")]
    InvalidHistory(String),
}

/// A callable tool as declared to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One assistant response: free text, requested tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Answer the conversation so far. System turns are instructions, the rest is history;
    /// `tools` may be empty, in which case the model must answer in text.
    async fn respond(&self, turns: &[AgentTurn], tools: &[ToolSpec]) -> Result<ModelReply, ModelError>;
}

/// `ChatModel` backed by an OpenRouter-hosted model through rig.
pub struct OpenRouterChatModel {
    model: openrouter::CompletionModel,
    timeout: Duration,
}

impl OpenRouterChatModel {
    pub fn new(api_key: &str, model_name: &str, timeout: Duration) -> Self {
        let client = openrouter::Client::new(api_key);
        Self {
            model: client.completion_model(model_name),
            timeout,
        }
    }
}

#[async_trait]
impl ChatModel for OpenRouterChatModel {
    async fn respond(&self, turns: &[AgentTurn], tools: &[ToolSpec]) -> Result<ModelReply, ModelError> {
        let conversation = chat_bridge::to_rig_conversation(turns);
        let mut messages = conversation.messages;
        let prompt = messages
            .pop()
            .ok_or_else(|| ModelError::InvalidHistory("no turns to answer".to_string()))?;

        let definitions: Vec<ToolDefinition> = tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            })
            .collect();

        debug!(
            history = messages.len(),
            tools = definitions.len(),
            "Sending completion request"
        );

        let request = self
            .model
            .completion_request(prompt)
            .preamble(conversation.preamble)
            .messages(messages)
            .tools(definitions)
            .build();

        let response = tokio::time::timeout(self.timeout, self.model.completion(request))
            .await
            .map_err(|_| ModelError::Timeout(self.timeout))?
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        Ok(chat_bridge::reply_from_choice(&response.choice))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records what it was asked.
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
        /// When the script runs out, keep returning this reply
        fallback: Option<ModelReply>,
        pub seen_tool_counts: Mutex<Vec<usize>>,
        pub seen_turn_counts: Mutex<Vec<usize>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<ModelReply, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fallback: None,
                seen_tool_counts: Mutex::new(Vec::new()),
                seen_turn_counts: Mutex::new(Vec::new()),
            }
        }

        pub fn repeating(reply: ModelReply) -> Self {
            Self {
                fallback: Some(reply),
                ..Self::new(Vec::new())
            }
        }

        pub fn calls(&self) -> usize {
            self.seen_tool_counts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn respond(&self, turns: &[AgentTurn], tools: &[ToolSpec]) -> Result<ModelReply, ModelError> {
            self.seen_tool_counts.lock().unwrap().push(tools.len());
            self.seen_turn_counts.lock().unwrap().push(turns.len());
            match self.replies.lock().unwrap().pop_front() {
                Some(reply) => reply,
                None => self
                    .fallback
                    .clone()
                    .ok_or_else(|| ModelError::Transport("script exhausted".to_string())),
            }
        }
    }
}
