use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Graph has no start task")]
    NoStartTask,

    #[error("Step limit of {0} exceeded before the graph completed")]
    StepLimitExceeded(usize),
}

pub type Result<T> = std::result::Result<T, GraphError>;
