use agent_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{ChatModel, ToolSpec};
use crate::tasks::session_keys;

pub const RATINGS_SYSTEM_PROMPT: &str = r#"You aggregate movie ratings, and you collect them ONLY from these online ticket-booking platforms:
- BookMyShow
- Paytm
- PVR Cinemas
- INOX Movies
- Cinepolis

Do not use figures from news outlets or general review sites (Times of India, 123 Telugu, NDTV, Hindustan Times, IMDb and the like). Use the search tools to find what each booking platform shows for the movie the user names.

For every platform report:
- platform: one of the five names above, spelled exactly as listed
- movie_title: the movie's title
- movie_rating: rating out of 10
- type_of_movie: genres, comma separated (e.g. "Action, Drama")
- positive_review_percentage: 0-100, estimated from user reviews if needed
- negative_review_percentage: 100 minus the positive percentage

Answer with a single JSON array holding one object per platform, for example:
[
  {
    "platform": "BookMyShow",
    "movie_title": "Dune: Part Two",
    "movie_rating": 9.2,
    "type_of_movie": "Sci-Fi, Adventure",
    "positive_review_percentage": 89,
    "negative_review_percentage": 11
  }
]

FORMAT RULES:
1. Property names and string values use double quotes.
2. Numbers are not quoted.
3. No prose, explanations or markdown around the array, and no code fences.
4. The answer starts with '[' and ends with ']'.
5. Every object carries all six fields.

If a platform has no data, still include it with your best estimate instead of apologizing.
"#;

/// Asks the model for its next move given the whole turn log.
///
/// Tools are declared only while the tool-round budget lasts; after that the model must answer in
/// text and any tool calls it still emits are dropped.
pub struct AgentTask {
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolSpec>,
    max_tool_rounds: usize,
}

impl AgentTask {
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<ToolSpec>, max_tool_rounds: usize) -> Self {
        Self {
            model,
            tools,
            max_tool_rounds,
        }
    }
}

#[async_trait]
impl Task for AgentTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let movie: String = context
            .get(session_keys::MOVIE_NAME)
            .await
            .unwrap_or_default();
        let rounds: usize = context.get(session_keys::TOOL_ROUNDS).await.unwrap_or(0);
        let tools_allowed = rounds < self.max_tool_rounds;
        let tools: &[ToolSpec] = if tools_allowed { &self.tools } else { &[] };

        info!(
            task_id = %self.id(),
            movie = %movie,
            rounds,
            tools = tools.len(),
            "Requesting model turn"
        );

        let turns = context.turns().await;
        let reply = self
            .model
            .respond(&turns, tools)
            .await
            .map_err(|e| GraphError::TaskExecutionFailed(e.to_string()))?;

        let tool_calls = if tools_allowed {
            reply.tool_calls
        } else {
            if !reply.tool_calls.is_empty() {
                warn!(
                    movie = %movie,
                    ignored = reply.tool_calls.len(),
                    "Tool budget spent, taking the model's text as final"
                );
            }
            Vec::new()
        };

        let status_message = if tool_calls.is_empty() {
            "Model produced its final answer".to_string()
        } else {
            format!("Model requested {} tool call(s)", tool_calls.len())
        };

        context.add_assistant_message(reply.text, tool_calls).await;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(status_message),
        ))
    }
}
