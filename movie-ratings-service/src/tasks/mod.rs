// Agent loop tasks: the model turn, tool execution, and the terminal answer
pub mod agent;
pub mod final_answer;
pub mod tools;

// Shared modules
pub mod types;

pub use agent::{AgentTask, RATINGS_SYSTEM_PROMPT};
pub use final_answer::FinalAnswerTask;
pub use tools::{SearchTool, ToolsTask};

pub use types::session_keys;
