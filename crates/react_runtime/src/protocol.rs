//! Response protocol shared by the generated Python runtime and the Rust loop.
//!
//! Every constant here is emitted verbatim into converted programs, so changing a
//! value changes the behaviour of every program converted afterwards.

use regex::Regex;
use std::sync::LazyLock;

use crate::template::render_template;

pub const THOUGHT_LABEL: &str = "Thought:";
pub const ACTION_LABEL: &str = "Action:";
pub const ACTION_INPUT_LABEL: &str = "Action Input:";
pub const OBSERVATION_LABEL: &str = "Observation:";

/// Terminal marker: everything after it is the final answer.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Action request pattern, valid for both the `regex` crate and Python's `re`.
pub const ACTION_PATTERN: &str =
    r"(?s)Action:[ \t]*([^\n]+?)[ \t]*\r?\n[ \t]*Action Input:[ \t]*(.*)";

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

pub const BUDGET_EXHAUSTED_MESSAGE: &str =
    "Agent stopped: iteration budget exhausted before a final answer was produced.";
pub const UNKNOWN_TOOL_MESSAGE: &str = "Error: unknown tool '{name}'. Available tools: {available}";
pub const MALFORMED_INPUT_MESSAGE: &str = "Error: invalid arguments for tool '{name}': {error}";
pub const TOOL_FAILURE_MESSAGE: &str = "Error: tool '{name}' failed: {error}";

/// Joins tool names wherever they are listed for the model.
pub const TOOL_NAME_SEPARATOR: &str = ", ";
pub const NO_TOOLS_LISTING: &str = "(none)";

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ACTION_PATTERN).expect("Invalid action regex"));

/// One parsed model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// The response carried the terminal marker.
    Final(String),
    /// A well-formed action request.
    Action { name: String, input: String },
    /// Neither marker nor action: the whole response is the answer.
    Implicit(String),
}

/// Classify a model response. The terminal marker wins over an action request.
pub fn parse_response(text: &str) -> AgentStep {
    if let Some(idx) = text.find(FINAL_ANSWER_MARKER) {
        let answer = &text[idx + FINAL_ANSWER_MARKER.len()..];
        return AgentStep::Final(answer.trim().to_string());
    }

    if let Some(caps) = ACTION_RE.captures(text) {
        let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let raw_input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if !name.is_empty() {
            return AgentStep::Action {
                name: name.to_string(),
                input: clean_action_input(raw_input),
            };
        }
    }

    AgentStep::Implicit(text.trim().to_string())
}

/// Drop anything the model hallucinated after the input and unwrap code fences.
pub fn clean_action_input(raw: &str) -> String {
    let mut text = raw
        .split(OBSERVATION_LABEL)
        .next()
        .unwrap_or_default()
        .trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest).trim();
        if let Some(inner) = text.strip_suffix("```") {
            text = inner.trim();
        }
    }

    text.to_string()
}

/// Tool names as listed in prompts and error observations.
pub fn tool_listing<S: AsRef<str>>(names: &[S]) -> String {
    if names.is_empty() {
        return NO_TOOLS_LISTING.to_string();
    }
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(TOOL_NAME_SEPARATOR)
}

pub fn unknown_tool_observation<S: AsRef<str>>(name: &str, available: &[S]) -> String {
    fill(
        UNKNOWN_TOOL_MESSAGE,
        &[("name", name), ("available", &tool_listing(available))],
    )
}

pub fn malformed_input_observation(name: &str, error: &str) -> String {
    fill(MALFORMED_INPUT_MESSAGE, &[("name", name), ("error", error)])
}

pub fn tool_failure_observation(name: &str, error: &str) -> String {
    fill(TOOL_FAILURE_MESSAGE, &[("name", name), ("error", error)])
}

// The message constants only hold known fields, so rendering cannot fail.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    render_template(template, values).unwrap_or_else(|_| template.to_string())
}
