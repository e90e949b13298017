pub mod context;
pub mod error;
pub mod graph;
pub mod session;
pub mod task;
pub mod turns;

// Re-export commonly used types
pub use context::Context;
pub use error::{GraphError, Result};
pub use graph::{DEFAULT_MAX_STEPS, ExecutionResult, ExecutionStatus, Graph, GraphBuilder};
pub use session::Session;
pub use task::{NextAction, Task, TaskResult};
pub use turns::{AgentTurn, Role, ToolInvocation};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct TestTask {
        id: String,
    }

    #[async_trait]
    impl Task for TestTask {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let input: String = context.get("input").await.unwrap_or_default();
            context.set("output", format!("Processed: {}", input)).await;

            Ok(TaskResult::new(
                Some("Task completed".to_string()),
                NextAction::End,
            ))
        }
    }

    /// Bumps a counter and keeps going until the counter reaches `stop_at`
    struct CountingTask {
        id: String,
        stop_at: u32,
    }

    #[async_trait]
    impl Task for CountingTask {
        fn id(&self) -> &str {
            &self.id
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let count = context.get::<u32>("count").await.unwrap_or_default() + 1;
            context.set("count", count).await;
            if count >= self.stop_at {
                Ok(TaskResult::new(Some(format!("stopped at {count}")), NextAction::End))
            } else {
                Ok(TaskResult::new(None, NextAction::ContinueAndExecute))
            }
        }
    }

    fn counting(id: &str, stop_at: u32) -> Arc<dyn Task> {
        Arc::new(CountingTask {
            id: id.to_string(),
            stop_at,
        })
    }

    #[tokio::test]
    async fn test_simple_graph_execution() {
        let task = Arc::new(TestTask {
            id: "test_task".to_string(),
        });

        let graph = GraphBuilder::new("test_graph").add_task(task).build();

        let mut session = graph.start_session("s1").unwrap();
        session.context.set("input", "Hello, World!").await;

        let result = graph.execute_session(&mut session).await.unwrap();

        assert_eq!(result.response.as_deref(), Some("Task completed"));
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.steps, 1);

        let output: String = session.context.get("output").await.unwrap();
        assert_eq!(output, "Processed: Hello, World!");
    }

    #[tokio::test]
    async fn continue_and_execute_follows_conditional_edges_in_one_call() {
        let graph = GraphBuilder::new("loop")
            .add_task(counting("a", 5))
            .add_task(counting("b", 5))
            .add_conditional_edge(
                "a",
                |ctx| ctx.get_sync::<u32>("count").unwrap_or(0) % 2 == 1,
                "b",
                "a",
            )
            .add_edge("b", "a")
            .build();

        let mut session = graph.start_session("s1").unwrap();
        let result = graph.execute_session(&mut session).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.response.as_deref(), Some("stopped at 5"));
        assert_eq!(result.steps, 5);
        assert_eq!(session.current_task_id, "a");
    }

    #[tokio::test]
    async fn step_limit_stops_a_graph_that_never_ends() {
        let graph = GraphBuilder::new("runaway")
            .add_task(counting("spin", u32::MAX))
            .add_edge("spin", "spin")
            .with_max_steps(7)
            .build();

        let mut session = graph.start_session("s1").unwrap();
        let err = graph.execute_session(&mut session).await.unwrap_err();

        assert!(matches!(err, GraphError::StepLimitExceeded(7)));
        assert_eq!(session.context.get_sync::<u32>("count"), Some(7));
    }

    #[tokio::test]
    async fn continue_pauses_after_advancing_one_task() {
        struct StepTask;

        #[async_trait]
        impl Task for StepTask {
            fn id(&self) -> &str {
                "step"
            }

            async fn run(&self, _context: Context) -> Result<TaskResult> {
                Ok(TaskResult::new(Some("one step".into()), NextAction::Continue))
            }
        }

        let graph = GraphBuilder::new("stepper")
            .add_task(Arc::new(StepTask))
            .add_task(counting("next", 1))
            .add_edge("step", "next")
            .build();

        let mut session = graph.start_session("s1").unwrap();
        let first = graph.execute_session(&mut session).await.unwrap();
        assert_eq!(first.status, ExecutionStatus::Paused);
        assert_eq!(session.current_task_id, "next");

        let second = graph.execute_session(&mut session).await.unwrap();
        assert_eq!(second.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn missing_tasks_and_empty_graphs_are_errors() {
        let empty = GraphBuilder::new("empty").build();
        assert!(matches!(empty.start_session("s"), Err(GraphError::NoStartTask)));

        let graph = GraphBuilder::new("dangling")
            .add_task(counting("a", 10))
            .add_edge("a", "nowhere")
            .build();
        let mut session = graph.start_session("s").unwrap();
        let err = graph.execute_session(&mut session).await.unwrap_err();
        assert!(matches!(err, GraphError::TaskNotFound(id) if id == "nowhere"));
    }
}
