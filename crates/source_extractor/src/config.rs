//! Recognized names for each extraction rule.

use serde::Deserialize;

/// Identifier sets the extractor matches against. Every list can be overridden
/// from the `[extraction]` table of the converter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Variable names holding the system prompt, in priority order.
    pub prompt_names: Vec<String>,
    /// Agent-construction functions taking a prompt keyword.
    pub agent_builders: Vec<String>,
    /// Keywords of the agent-construction call that carry the prompt.
    pub prompt_keywords: Vec<String>,
    /// Builders taking a list of `(role, content)` messages.
    pub message_builders: Vec<String>,
    /// Message classes whose instances carry the system prompt.
    pub system_message_classes: Vec<String>,
    /// Decorator names marking a function as a tool.
    pub tool_decorators: Vec<String>,
    /// Name prefix of the "read input from file" helper.
    pub read_helper_prefix: String,
    /// Top-level names treated as mutable outcome-tracking state.
    pub state_names: Vec<String>,
    /// Import roots that belong to the orchestration framework and are dropped.
    pub framework_modules: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            prompt_names: strings(&[
                "REACT_SYSTEM_PROMPT",
                "SYSTEM_PROMPT",
                "REACT_PROMPT",
                "AGENT_PROMPT",
                "SYSTEM_MESSAGE",
                "PROMPT",
            ]),
            agent_builders: strings(&[
                "create_react_agent",
                "create_tool_calling_agent",
                "create_agent",
            ]),
            prompt_keywords: strings(&["prompt", "state_modifier"]),
            message_builders: strings(&["from_messages"]),
            system_message_classes: strings(&["SystemMessage"]),
            tool_decorators: strings(&["tool"]),
            read_helper_prefix: "read".to_string(),
            state_names: strings(&[
                "FINAL_RESULT",
                "AGENT_RESULT",
                "TASK_RESULT",
                "RESULT",
                "OUTCOME",
            ]),
            framework_modules: strings(&[
                "langchain",
                "langgraph",
                "langsmith",
                "openai",
                "dotenv",
            ]),
        }
    }
}

impl ExtractionConfig {
    /// `langchain_openai` and `langchain.tools` both belong to `langchain`.
    pub fn is_framework_module(&self, root: &str) -> bool {
        self.framework_modules.iter().any(|m| {
            root == m
                || root
                    .strip_prefix(m.as_str())
                    .is_some_and(|rest| rest.starts_with('_'))
        })
    }

    pub fn is_tool_decorator(&self, name: &str) -> bool {
        self.tool_decorators.iter().any(|d| d == name)
    }
}
