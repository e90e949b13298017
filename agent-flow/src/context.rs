use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::turns::{AgentTurn, ToolInvocation};

/// Context shared between the tasks of one graph execution.
///
/// Holds a typed key/value store plus the conversation's turn log. The turn log only ever
/// grows; readers get owned snapshots so a task never observes a half-written history.
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
    turns: Arc<RwLock<Vec<AgentTurn>>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            turns: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.data.insert(key, value);
            }
            Err(e) => warn!(key = %key, error = %e, "Dropping context value that failed to serialize"),
        }
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    /// Synchronous read, for edge conditions.
    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    fn read_turns(&self) -> RwLockReadGuard<'_, Vec<AgentTurn>> {
        self.turns.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_turns(&self) -> RwLockWriteGuard<'_, Vec<AgentTurn>> {
        self.turns.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn append_turn(&self, turn: AgentTurn) {
        self.write_turns().push(turn);
    }

    pub async fn add_system_message(&self, content: impl Into<String>) {
        self.append_turn(AgentTurn::system(content)).await;
    }

    pub async fn add_user_message(&self, content: impl Into<String>) {
        self.append_turn(AgentTurn::human(content)).await;
    }

    pub async fn add_assistant_message(
        &self,
        content: impl Into<String>,
        tool_calls: Vec<ToolInvocation>,
    ) {
        self.append_turn(AgentTurn::assistant(content, tool_calls))
            .await;
    }

    pub async fn add_tool_result(
        &self,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.append_turn(AgentTurn::tool_result(tool_call_id, content))
            .await;
    }

    /// Owned snapshot of the whole turn log, oldest first.
    pub async fn turns(&self) -> Vec<AgentTurn> {
        self.read_turns().clone()
    }

    pub fn last_turn(&self) -> Option<AgentTurn> {
        self.read_turns().last().cloned()
    }

    pub fn turn_count(&self) -> usize {
        self.read_turns().len()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
