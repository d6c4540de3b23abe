//! Static extraction of tools, system prompt and supporting definitions from
//! framework-based ReAct agent programs.

pub mod config;
pub mod literal;
pub mod markers;
pub mod module;
pub mod prompt;
pub mod support;
pub mod tools;
pub mod types;

use log::{debug, info, warn};
use std::collections::BTreeSet;
use thiserror::Error;

pub use config::ExtractionConfig;
pub use markers::{RUNTIME_CLASS_NAME, is_already_converted, needs_conversion};
pub use module::SourceModule;
pub use types::*;

/// Prompt used when no system prompt can be located.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that solves tasks step by step using the available tools.

## Available Tools
{tool_descriptions}

Today's date is {current_date}.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to initialize the Python parser: {0}")]
    ParserInit(String),
    #[error("Parser produced no syntax tree")]
    NoTree,
    #[error("Syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

/// Run every extraction rule over a parsed module.
pub fn extract(module: &SourceModule, cfg: &ExtractionConfig) -> ExtractionBundle {
    let label = module
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string());

    let mut warnings = Vec::new();
    let tools = tools::extract_tools(module, cfg, &mut warnings);

    let prompt = prompt::locate_prompt(module, cfg);
    if prompt.is_none() {
        warn!("{}: no system prompt found", label);
        warnings.push(ExtractionWarning::PromptNotFound);
    }

    let helper = support::extract_helper(module, cfg);
    let state = support::extract_state(module, cfg);
    let imports = support::extract_imports(module, cfg);

    let mut excluded: BTreeSet<String> = BTreeSet::new();
    if let Some(helper) = &helper {
        excluded.insert(helper.name.clone());
    }
    if let Some(PromptSource::Assignment { name }) = prompt.as_ref().map(|p| &p.source) {
        excluded.insert(name.clone());
    }
    let support = support::extract_support(
        module,
        cfg,
        &tools,
        helper.as_ref().map(|h| h.name.as_str()),
        &excluded,
    );

    debug!(
        "{}: helper={:?}, state={:?}, support={:?}",
        label,
        helper.as_ref().map(|h| &h.name),
        state.iter().map(|s| &s.name).collect::<Vec<_>>(),
        support.iter().map(|s| &s.name).collect::<Vec<_>>()
    );
    info!(
        "{}: extracted {} tool(s), prompt from {}",
        label,
        tools.len(),
        prompt
            .as_ref()
            .map(|p| p.source.to_string())
            .unwrap_or_else(|| PromptSource::Fallback.to_string())
    );

    ExtractionBundle {
        tools,
        prompt,
        helper,
        state,
        imports,
        support,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = r#"
import json
from langchain_core.tools import tool
from langgraph.prebuilt import create_react_agent

SYSTEM_PROMPT = """You are a data assistant.

## Available Tools
- lookup: find records
"""

FINAL_RESULT = {"answer": None}

@tool
def lookup(key: str) -> str:
    """Look up a record."""
    return json.dumps({"key": key})

def read_input_file(path):
    with open(path) as fh:
        return fh.read()

agent = create_react_agent(llm, [lookup], prompt=SYSTEM_PROMPT)
"#;

    #[test]
    fn test_extract_full_bundle() {
        let module = SourceModule::parse(AGENT).unwrap();
        let bundle = extract(&module, &ExtractionConfig::default());
        assert_eq!(bundle.tool_names(), vec!["lookup"]);
        assert!(bundle.prompt.as_ref().unwrap().raw.starts_with("You are a data assistant."));
        assert_eq!(bundle.helper.as_ref().unwrap().name, "read_input_file");
        assert_eq!(bundle.state.len(), 1);
        assert_eq!(bundle.imports.len(), 1);
        assert!(bundle.support.is_empty());
        assert!(bundle.warnings.is_empty());
    }

    #[test]
    fn test_missing_prompt_falls_back() {
        let module = SourceModule::parse("@tool\ndef ping() -> str:\n    return 'pong'\n").unwrap();
        let bundle = extract(&module, &ExtractionConfig::default());
        assert!(bundle.prompt.is_none());
        assert_eq!(bundle.warnings, vec![ExtractionWarning::PromptNotFound]);
        let prompt = bundle.prompt_or_default();
        assert_eq!(prompt.source, PromptSource::Fallback);
        assert_eq!(prompt.placeholders.len(), 2);
    }

    #[test]
    fn test_zero_tools_is_valid() {
        let module = SourceModule::parse("SYSTEM_PROMPT = 'hi'\n").unwrap();
        let bundle = extract(&module, &ExtractionConfig::default());
        assert!(bundle.tools.is_empty());
        assert_eq!(bundle.prompt.unwrap().raw, "hi");
    }
}
