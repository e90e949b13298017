use agent_flow::{Context, ExecutionStatus, Graph, GraphBuilder, GraphError, Task};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::llm::ChatModel;
use crate::search::SearchAdapter;
use crate::tasks::*;

/// Hard step limit for a loop allowed `max_tool_rounds` tool rounds: an agent and a tools step per
/// round, then the final agent turn and the answer.
pub fn step_limit(max_tool_rounds: usize) -> usize {
    2 * max_tool_rounds + 2
}

/// The agent loop as a graph: the agent turn branches to tool execution while the model asks for
/// tools, tools always lead back to the agent, and anything else ends with the final answer.
pub fn build_ratings_workflow(
    model: Arc<dyn ChatModel>,
    search: Arc<SearchAdapter>,
    max_tool_rounds: usize,
) -> Graph {
    let agent_task = Arc::new(AgentTask::new(
        model,
        SearchTool::all_specs(),
        max_tool_rounds,
    ));
    let agent_id = agent_task.id().to_string();

    let tools_task = Arc::new(ToolsTask::new(search));
    let tools_id = tools_task.id().to_string();

    let final_task = Arc::new(FinalAnswerTask);
    let final_id = final_task.id().to_string();

    GraphBuilder::new("movie_ratings_workflow")
        .add_task(agent_task)
        .add_task(tools_task)
        .add_task(final_task)
        .add_conditional_edge(
            &agent_id,
            |context: &Context| context.last_turn().is_some_and(|turn| turn.requests_tools()),
            &tools_id,
            &final_id,
        )
        .add_edge(&tools_id, &agent_id)
        .set_start_task(&agent_id)
        .with_max_steps(step_limit(max_tool_rounds))
        .build()
}

/// Run one fresh session of the loop for `movie_name` and return the model's final text.
pub async fn run_agent_loop(graph: &Graph, movie_name: &str) -> Result<String, GraphError> {
    let session_id = Uuid::new_v4().to_string();
    let mut session = graph.start_session(session_id.clone())?;

    session.context.add_system_message(RATINGS_SYSTEM_PROMPT).await;
    session.context.add_user_message(movie_name).await;
    session
        .context
        .set(session_keys::MOVIE_NAME, movie_name)
        .await;

    let result = graph.execute_session(&mut session).await?;
    info!(
        session_id = %session_id,
        movie = %movie_name,
        steps = result.steps,
        status = ?result.status,
        "Agent loop returned"
    );

    match result.status {
        ExecutionStatus::Completed => Ok(result.response.unwrap_or_default()),
        ExecutionStatus::Paused => Err(GraphError::TaskExecutionFailed(format!(
            "agent loop paused at {} without an answer",
            session.current_task_id
        ))),
    }
}
