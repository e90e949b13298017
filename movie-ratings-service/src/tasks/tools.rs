use agent_flow::{Context, GraphError, NextAction, Result, Task, TaskResult, ToolInvocation};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::ToolSpec;
use crate::search::{SearchAdapter, filter_results};
use crate::tasks::session_keys;

/// The search tools offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTool {
    MovieSearch,
    MultiSearch,
}

impl SearchTool {
    pub const ALL: [SearchTool; 2] = [SearchTool::MovieSearch, SearchTool::MultiSearch];

    pub fn name(self) -> &'static str {
        match self {
            SearchTool::MovieSearch => "filtered_movie_search",
            SearchTool::MultiSearch => "filtered_multi_search",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn spec(self) -> ToolSpec {
        let description = match self {
            SearchTool::MovieSearch => {
                "Search the web for a movie's ratings on ticket-booking platforms. \
                 Mention a platform name to restrict the search to its site."
            }
            SearchTool::MultiSearch => {
                "Search ticket-booking platforms for a movie while excluding news and review \
                 sites. Retries when nothing useful comes back."
            }
        };

        ToolSpec {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query, e.g. \"Jawan BookMyShow rating\""
                    }
                },
                "required": ["query"]
            }),
        }
    }

    pub fn all_specs() -> Vec<ToolSpec> {
        Self::ALL.into_iter().map(SearchTool::spec).collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Accept arguments as an object or as a JSON-encoded string of one.
fn parse_args(arguments: &Value) -> std::result::Result<SearchArgs, String> {
    let parsed: serde_json::Result<SearchArgs> = match arguments {
        Value::String(encoded) => serde_json::from_str(encoded),
        other => serde_json::from_value(other.clone()),
    };
    match parsed {
        Ok(args) if !args.query.trim().is_empty() => Ok(args),
        Ok(_) => Err("query must not be empty".to_string()),
        Err(e) => Err(format!("invalid arguments: {e}")),
    }
}

fn error_output(message: impl Into<String>) -> String {
    json!({ "error": message.into() }).to_string()
}

/// Runs the tool calls of the last assistant turn and appends one tool-result turn per call.
pub struct ToolsTask {
    search: Arc<SearchAdapter>,
}

impl ToolsTask {
    pub fn new(search: Arc<SearchAdapter>) -> Self {
        Self { search }
    }

    async fn invoke(&self, call: &ToolInvocation) -> String {
        let Some(tool) = SearchTool::from_name(&call.name) else {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return error_output(format!("Unknown tool: {}", call.name));
        };

        let args = match parse_args(&call.arguments) {
            Ok(args) => args,
            Err(message) => {
                warn!(tool = %call.name, error = %message, "Rejected tool arguments");
                return error_output(message);
            }
        };

        let raw = match tool {
            SearchTool::MovieSearch => self.search.search(&args.query).await,
            SearchTool::MultiSearch => self.search.multi_search(&args.query).await,
        };
        let filtered = filter_results(raw);
        info!(tool = tool.name(), hits = filtered.hit_count(), "Tool call finished");

        serde_json::to_string(&filtered)
            .unwrap_or_else(|e| error_output(format!("failed to encode results: {e}")))
    }
}

#[async_trait]
impl Task for ToolsTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let turn = context
            .last_turn()
            .filter(|turn| turn.requests_tools())
            .ok_or_else(|| GraphError::ContextError("no pending tool calls".to_string()))?;

        info!(task_id = %self.id(), calls = turn.tool_calls.len(), "Executing tool calls");

        let outputs = join_all(turn.tool_calls.iter().map(|call| self.invoke(call))).await;
        for (call, output) in turn.tool_calls.iter().zip(outputs) {
            context.add_tool_result(call.id.clone(), output).await;
        }

        let rounds: usize = context.get(session_keys::TOOL_ROUNDS).await.unwrap_or(0);
        context.set(session_keys::TOOL_ROUNDS, rounds + 1).await;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(format!("Completed tool round {}", rounds + 1)),
        ))
    }
}
