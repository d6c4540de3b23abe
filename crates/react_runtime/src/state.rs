//! Caller-owned agent state.
//!
//! Converted programs keep their outcome-tracking globals; the Rust loop models the
//! same record as an explicit handle passed into each run.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    initial: Map<String, Value>,
    current: Map<String, Value>,
}

impl AgentState {
    pub fn new(initial: Map<String, Value>) -> Self {
        Self {
            current: initial.clone(),
            initial,
        }
    }

    /// Build from a JSON object; any other value yields an empty state.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.current.insert(key.into(), value);
    }

    /// Restore the record to the values it was created with.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
    }

    pub fn snapshot(&self) -> &Map<String, Value> {
        &self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.initial
    }
}
