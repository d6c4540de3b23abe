//! Name-keyed tool dispatch.
//!
//! Dispatch never fails: unknown names, bad arguments and tool errors all become
//! observation strings the loop feeds back to the model.

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::protocol::{
    malformed_input_observation, tool_failure_observation, unknown_tool_observation,
};
use crate::state::AgentState;

pub type ToolArguments = Map<String, Value>;

type ToolFn = Box<dyn Fn(&ToolArguments, &mut AgentState) -> anyhow::Result<String> + Send + Sync>;

struct RegisteredTool {
    name: String,
    description: String,
    call: ToolFn,
}

/// Tools in registration order, which is also the order they are listed in.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier tool with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, description: impl Into<String>, call: F)
    where
        F: Fn(&ToolArguments, &mut AgentState) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let tool = RegisteredTool {
            name: name.into(),
            description: description.into(),
            call: Box::new(call),
        };
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `- name: description` lines, the shape `{tool_descriptions}` expects.
    pub fn descriptions(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run the named tool and return the observation text.
    pub fn dispatch(&self, name: &str, raw_input: &str, state: &mut AgentState) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name == name) else {
            warn!("Model requested unknown tool: {}", name);
            return unknown_tool_observation(name, &self.names());
        };

        let arguments = match parse_arguments(raw_input) {
            Ok(arguments) => arguments,
            Err(reason) => {
                warn!("Invalid arguments for tool {}: {}", name, reason);
                return malformed_input_observation(name, &reason);
            }
        };

        debug!("Invoking tool {} with {} argument(s)", name, arguments.len());
        match (tool.call)(&arguments, state) {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {:#}", name, e);
                tool_failure_observation(name, &format!("{:#}", e))
            }
        }
    }
}

/// Decode an action input into keyword arguments. Empty input means no arguments.
pub fn parse_arguments(raw_input: &str) -> Result<ToolArguments, String> {
    let raw_input = raw_input.trim();
    if raw_input.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw_input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register("add", "Add two integers", |args, _state| {
            let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
            let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
            Ok((a + b).to_string())
        });
        tools.register("mark_done", "Record the outcome", |_args, state| {
            state.set("status", json!("done"));
            Ok("recorded".to_string())
        });
        tools.register("explode", "Always fails", |_args, _state| Err(anyhow!("boom")));
        tools
    }

    #[test]
    fn test_dispatch_known_tool() {
        let mut state = AgentState::default();
        let out = registry().dispatch("add", r#"{"a": 2, "b": 3}"#, &mut state);
        assert_eq!(out, "5");
    }

    #[test]
    fn test_dispatch_mutates_caller_state() {
        let mut state = AgentState::from_value(json!({"status": null}));
        registry().dispatch("mark_done", "", &mut state);
        assert_eq!(state.get("status"), Some(&json!("done")));
    }

    #[test]
    fn test_unknown_tool_is_observation() {
        let mut state = AgentState::default();
        let out = registry().dispatch("teleport", "{}", &mut state);
        assert_eq!(
            out,
            "Error: unknown tool 'teleport'. Available tools: add, mark_done, explode"
        );
    }

    #[test]
    fn test_bad_arguments_are_observations() {
        let mut state = AgentState::default();
        let tools = registry();
        let out = tools.dispatch("add", "{not json", &mut state);
        assert!(out.starts_with("Error: invalid arguments for tool 'add':"));
        let out = tools.dispatch("add", "[1, 2]", &mut state);
        assert_eq!(out, "Error: invalid arguments for tool 'add': expected a JSON object");
    }

    #[test]
    fn test_tool_error_is_observation() {
        let mut state = AgentState::default();
        let out = registry().dispatch("explode", "{}", &mut state);
        assert_eq!(out, "Error: tool 'explode' failed: boom");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut tools = registry();
        tools.register("add", "Replaced", |_args, _state| Ok("replaced".to_string()));
        assert_eq!(tools.len(), 3);
        let mut state = AgentState::default();
        assert_eq!(tools.dispatch("add", "{}", &mut state), "replaced");
        assert!(tools.descriptions().contains("- add: Replaced"));
    }
}
