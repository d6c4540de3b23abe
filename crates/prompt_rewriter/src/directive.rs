//! The response protocol block appended to every rewritten prompt.

use react_runtime::protocol::{
    ACTION_INPUT_LABEL, ACTION_LABEL, FINAL_ANSWER_MARKER, OBSERVATION_LABEL, THOUGHT_LABEL,
    tool_listing,
};

pub const DIRECTIVE_HEADER: &str = "## Response Format";

/// Step labels plus the exact tool names the model may call.
pub fn protocol_directive(tool_names: &[&str]) -> String {
    let listing = tool_listing(tool_names);
    let mut out = String::new();
    out.push_str(DIRECTIVE_HEADER);
    out.push_str("\nUse the following format:\n\n");
    out.push_str(&format!("{} <reason about what to do next>\n", THOUGHT_LABEL));
    out.push_str(&format!(
        "{} <the tool to use, exactly one of [{}]>\n",
        ACTION_LABEL, listing
    ));
    out.push_str(&format!(
        "{} <the tool arguments as a JSON object>\n",
        ACTION_INPUT_LABEL
    ));
    out.push_str(&format!(
        "{} <the tool result, provided to you>\n",
        OBSERVATION_LABEL
    ));
    out.push_str("... (Thought/Action/Action Input/Observation can repeat)\n");
    out.push_str(&format!("{} I now know the final answer\n", THOUGHT_LABEL));
    out.push_str(&format!(
        "{} <the final response to the user>\n\n",
        FINAL_ANSWER_MARKER
    ));
    out.push_str(&format!("Available tool names: {}\n", listing));
    out
}
