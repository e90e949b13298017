use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    context::Context,
    error::{GraphError, Result},
    session::Session,
    task::{NextAction, Task, TaskResult},
};

/// Default ceiling on tasks run by a single `execute_session` call
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Where an edge leads
#[derive(Clone)]
enum EdgeTarget {
    Fixed(String),
    Branch {
        condition: EdgeCondition,
        yes: String,
        no: String,
    },
}

/// Edge between tasks in the graph
#[derive(Clone)]
struct Edge {
    from: String,
    target: EdgeTarget,
}

/// A graph of tasks that can be executed
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    start_task_id: Option<String>,
    max_steps: usize,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            edges: Vec::new(),
            start_task_id: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Start a session positioned on the start task
    pub fn start_session(&self, session_id: impl Into<String>) -> Result<Session> {
        let start = self.start_task_id.as_deref().ok_or(GraphError::NoStartTask)?;
        let mut session = Session::new_from_task(session_id.into(), start);
        session.graph_id = self.id.clone();
        Ok(session)
    }

    /// Run tasks from the session's current task until one ends the graph, one hands control
    /// back with `NextAction::Continue`, or the step limit is hit.
    pub async fn execute_session(&self, session: &mut Session) -> Result<ExecutionResult> {
        let mut steps = 0;

        loop {
            if steps >= self.max_steps {
                return Err(GraphError::StepLimitExceeded(self.max_steps));
            }
            steps += 1;

            let result = self
                .execute_single_task(&session.current_task_id, session.context.clone())
                .await?;
            session.status_message = result.status_message.clone();

            match result.next_action {
                NextAction::End => {
                    session.current_task_id = result.task_id;
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::Completed,
                        steps,
                    });
                }
                NextAction::Continue => {
                    if let Some(next_task_id) =
                        self.find_next_task(&result.task_id, &session.context)
                    {
                        session.current_task_id = next_task_id;
                    }
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::Paused,
                        steps,
                    });
                }
                NextAction::ContinueAndExecute => {
                    match self.find_next_task(&result.task_id, &session.context) {
                        Some(next_task_id) => {
                            debug!(from = %result.task_id, to = %next_task_id, step = steps, "Advancing graph");
                            session.current_task_id = next_task_id;
                        }
                        None => {
                            session.current_task_id = result.task_id;
                            return Ok(ExecutionResult {
                                response: result.response,
                                status: ExecutionStatus::Paused,
                                steps,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Execute a single task without following its next action
    async fn execute_single_task(&self, task_id: &str, context: Context) -> Result<TaskResult> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))?;

        let mut result = task.run(context).await?;
        result.task_id = task_id.to_string();

        Ok(result)
    }

    /// Find the next task based on edges and conditions; the first edge leaving the task wins
    pub fn find_next_task(&self, current_task_id: &str, context: &Context) -> Option<String> {
        self.edges
            .iter()
            .find(|edge| edge.from == current_task_id)
            .map(|edge| match &edge.target {
                EdgeTarget::Fixed(to) => to.clone(),
                EdgeTarget::Branch { condition, yes, no } => {
                    if condition(context) {
                        yes.clone()
                    } else {
                        no.clone()
                    }
                }
            })
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    /// Add a task; the first task added becomes the start task
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.tasks.is_empty() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.push(Edge {
            from: from.into(),
            target: EdgeTarget::Fixed(to.into()),
        });
        self
    }

    /// Route to `yes` when `condition` holds on the context, otherwise to `no`
    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        condition: F,
        yes: impl Into<String>,
        no: impl Into<String>,
    ) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.graph.edges.push(Edge {
            from: from.into(),
            target: EdgeTarget::Branch {
                condition: Arc::new(condition),
                yes: yes.into(),
                no: no.into(),
            },
        });
        self
    }

    pub fn set_start_task(mut self, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        if self.graph.tasks.contains_key(&task_id) {
            self.graph.start_task_id = Some(task_id);
        }
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.graph.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

/// Status of graph execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status: ExecutionStatus,
    /// Number of tasks run by this call
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// A task handed control back; calling again resumes at the next task
    Paused,
    /// A task ended the graph
    Completed,
}
