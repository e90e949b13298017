//! Bridge module for converting between the agent turn log and rig's completion messages.

use agent_flow::{AgentTurn, Role, ToolInvocation};
use rig::OneOrMany;
use rig::message::{AssistantContent, Message, ToolResultContent, UserContent};

use crate::llm::ModelReply;

/// A turn log split the way rig wants it: instructions apart from the message history.
pub struct RigConversation {
    pub preamble: String,
    pub messages: Vec<Message>,
}

/// Convert a turn log. System turns are joined into the preamble; every other turn becomes one
/// message in order.
pub fn to_rig_conversation(turns: &[AgentTurn]) -> RigConversation {
    let mut preamble = Vec::new();
    let mut messages = Vec::with_capacity(turns.len());

    for turn in turns {
        match turn.role {
            Role::System => preamble.push(turn.content.as_str()),
            Role::Human => messages.push(Message::user(turn.content.clone())),
            Role::Assistant => messages.push(assistant_message(turn)),
            Role::Tool => messages.push(tool_result_message(turn)),
        }
    }

    RigConversation {
        preamble: preamble.join("\n\n"),
        messages,
    }
}

fn assistant_message(turn: &AgentTurn) -> Message {
    let mut content = Vec::with_capacity(turn.tool_calls.len() + 1);
    if !turn.content.is_empty() {
        content.push(AssistantContent::text(turn.content.clone()));
    }
    for call in &turn.tool_calls {
        content.push(AssistantContent::tool_call(
            call.id.clone(),
            call.name.clone(),
            call.arguments.clone(),
        ));
    }

    let content = OneOrMany::many(content).unwrap_or_else(|_| OneOrMany::one(AssistantContent::text("")));
    Message::Assistant { id: None, content }
}

fn tool_result_message(turn: &AgentTurn) -> Message {
    let call_id = turn.tool_call_id.clone().unwrap_or_default();
    Message::User {
        content: OneOrMany::one(UserContent::tool_result(
            call_id,
            OneOrMany::one(ToolResultContent::text(turn.content.clone())),
        )),
    }
}

/// Collapse a model choice into text plus tool invocations; other content kinds are ignored.
pub fn reply_from_choice(choice: &OneOrMany<AssistantContent>) -> ModelReply {
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for content in choice.iter() {
        match content {
            AssistantContent::Text(text) => texts.push(text.text.clone()),
            AssistantContent::ToolCall(call) => tool_calls.push(ToolInvocation::new(
                call.id.clone(),
                call.function.name.clone(),
                call.function.arguments.clone(),
            )),
            _ => {}
        }
    }

    ModelReply {
        text: texts.join("\n"),
        tool_calls,
    }
}
