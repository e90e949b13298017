use agent_flow::{Context, GraphError, NextAction, Result, Role, Task, TaskResult};
use async_trait::async_trait;
use tracing::info;

/// Ends the loop, returning the last assistant turn's text as the loop's output.
pub struct FinalAnswerTask;

#[async_trait]
impl Task for FinalAnswerTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let answer = context
            .last_turn()
            .filter(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content)
            .ok_or_else(|| GraphError::ContextError("no assistant answer to return".to_string()))?;

        info!(task_id = %self.id(), length = answer.len(), "Agent loop finished");

        Ok(TaskResult::new_with_status(
            Some(answer),
            NextAction::End,
            Some("Final answer ready".to_string()),
        ))
    }
}
