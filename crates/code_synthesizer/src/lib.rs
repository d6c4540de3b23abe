//! Assembles the converted Python program from extracted entities, the
//! rewritten prompt and the fixed runtime boilerplate.

pub mod config;
pub mod descriptions;
pub mod literal;
pub mod templates;

use log::{debug, error};
use std::collections::BTreeSet;
use thiserror::Error;

use prompt_rewriter::RewrittenPrompt;
use react_runtime::protocol::{
    ACTION_PATTERN, BUDGET_EXHAUSTED_MESSAGE, FINAL_ANSWER_MARKER, MALFORMED_INPUT_MESSAGE,
    NO_TOOLS_LISTING, OBSERVATION_LABEL, TOOL_FAILURE_MESSAGE, TOOL_NAME_SEPARATOR,
    UNKNOWN_TOOL_MESSAGE,
};
use react_runtime::{RenderError, template_fields};
use source_extractor::{ExtractError, ExtractionBundle, Placeholder, SourceModule};

pub use config::GenerationConfig;
pub use descriptions::tool_descriptions;
use literal::{python_pattern, python_string};
use templates::*;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("prompt template is not renderable: {0}")]
    Template(#[from] RenderError),

    #[error("prompt template uses unknown placeholder '{0}'")]
    UnknownPlaceholder(String),

    #[error("generated module does not parse: {0}")]
    InvalidOutput(ExtractError),
}

/// Complete text of a converted program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub text: String,
    /// Keys of the generated `TOOLS` table, in emission order.
    pub dispatch_keys: Vec<String>,
}

/// Build the program text in memory and check that it parses.
pub fn synthesize(
    bundle: &ExtractionBundle,
    prompt: &RewrittenPrompt,
    cfg: &GenerationConfig,
) -> Result<GeneratedModule, SynthesisError> {
    check_template(&prompt.template)?;

    let dispatch_keys: Vec<String> = bundle.tools.iter().map(|t| t.name.clone()).collect();
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!("{}\n{}", HEADER_DOCSTRING, GENERATED_MARKER));
    sections.push(imports_section(bundle));
    if !bundle.support.is_empty() {
        sections.push(
            bundle
                .support
                .iter()
                .map(|s| s.source.trim_end().to_string())
                .collect::<Vec<_>>()
                .join("\n\n\n"),
        );
    }
    sections.push(constants_section(cfg));
    sections.push(state_section(bundle));

    let helper_name = match &bundle.helper {
        Some(helper) => {
            sections.push(helper.source.trim_end().to_string());
            helper.name.clone()
        }
        None => {
            sections.push(DEFAULT_HELPER.to_string());
            DEFAULT_HELPER_NAME.to_string()
        }
    };

    for tool in &bundle.tools {
        sections.push(tool.source.trim_end().to_string());
    }

    sections.push(tools_table(&dispatch_keys));
    sections.push(format!(
        "TOOL_DESCRIPTIONS = {}\n\nSYSTEM_PROMPT_TEMPLATE = {}",
        python_string(&tool_descriptions(&bundle.tools)),
        python_string(&prompt.template)
    ));
    sections.push(RUNTIME.to_string());
    sections.push(main_function(&helper_name));

    let mut text = sections
        .iter()
        .map(|s| s.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n\n");
    text.push('\n');

    if let Err(e) = SourceModule::parse(text.as_str()) {
        error!("Generated module failed to parse: {}", e);
        return Err(SynthesisError::InvalidOutput(e));
    }
    debug!(
        "Generated {} bytes with {} tool(s)",
        text.len(),
        dispatch_keys.len()
    );

    Ok(GeneratedModule {
        text,
        dispatch_keys,
    })
}

/// Only the two recognized placeholders may remain substitutable.
fn check_template(template: &str) -> Result<(), SynthesisError> {
    for field in template_fields(template)? {
        if !Placeholder::ALL.iter().any(|p| p.name() == field) {
            return Err(SynthesisError::UnknownPlaceholder(field));
        }
    }
    Ok(())
}

fn imports_section(bundle: &ExtractionBundle) -> String {
    let mut seen: BTreeSet<&str> = FIXED_IMPORTS.iter().copied().collect();
    seen.insert(CLIENT_IMPORT);

    let mut lines: Vec<&str> = Vec::new();
    for import in bundle.imports.iter().filter(|i| i.is_future) {
        if seen.insert(import.statement.as_str()) {
            lines.push(&import.statement);
        }
    }
    if !lines.is_empty() {
        lines.push("");
    }
    lines.extend(FIXED_IMPORTS);
    lines.push("");
    lines.push(CLIENT_IMPORT);

    let carried: Vec<&str> = bundle
        .imports
        .iter()
        .filter(|i| !i.is_future)
        .map(|i| i.statement.as_str())
        .filter(|s| seen.insert(*s))
        .collect();
    if !carried.is_empty() {
        lines.push("");
        lines.extend(carried);
    }
    lines.join("\n")
}

fn constants_section(cfg: &GenerationConfig) -> String {
    let constants = [
        ("FINAL_ANSWER_MARKER", python_string(FINAL_ANSWER_MARKER)),
        ("OBSERVATION_LABEL", python_string(OBSERVATION_LABEL)),
        ("ACTION_PATTERN", python_pattern(ACTION_PATTERN)),
        ("DEFAULT_MAX_ITERATIONS", cfg.max_iterations.to_string()),
        ("BUDGET_EXHAUSTED_MESSAGE", python_string(BUDGET_EXHAUSTED_MESSAGE)),
        ("UNKNOWN_TOOL_MESSAGE", python_string(UNKNOWN_TOOL_MESSAGE)),
        ("MALFORMED_INPUT_MESSAGE", python_string(MALFORMED_INPUT_MESSAGE)),
        ("TOOL_FAILURE_MESSAGE", python_string(TOOL_FAILURE_MESSAGE)),
        ("TOOL_NAME_SEPARATOR", python_string(TOOL_NAME_SEPARATOR)),
        ("NO_TOOLS_LISTING", python_string(NO_TOOLS_LISTING)),
        ("DEFAULT_MODEL", python_string(&cfg.default_model)),
        ("DEFAULT_BASE_URL", python_string(&cfg.default_base_url)),
        ("DEFAULT_API_KEY", python_string(&cfg.default_api_key)),
    ];
    constants
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn state_section(bundle: &ExtractionBundle) -> String {
    if bundle.state.is_empty() {
        return RESET_STATE_EMPTY.to_string();
    }

    let names: Vec<&str> = bundle.state.iter().map(|s| s.name.as_str()).collect();
    let mut out = String::new();
    for state in &bundle.state {
        out.push_str(state.source.trim_end());
        out.push('\n');
    }
    out.push_str("\n_INITIAL_STATE = {\n");
    for name in &names {
        out.push_str(&format!("    \"{}\": copy.deepcopy({}),\n", name, name));
    }
    out.push_str("}\n\n\ndef _reset_state():\n");
    out.push_str("    \"\"\"Restore module-level state to its declared initial values.\"\"\"\n");
    out.push_str(&format!("    global {}\n", names.join(", ")));
    for name in &names {
        out.push_str(&format!(
            "    {} = copy.deepcopy(_INITIAL_STATE[\"{}\"])\n",
            name, name
        ));
    }
    out
}

fn tools_table(keys: &[String]) -> String {
    if keys.is_empty() {
        return "TOOLS = {}".to_string();
    }
    let mut out = String::from("TOOLS = {\n");
    for key in keys {
        out.push_str(&format!("    {}: {},\n", python_string(key), key));
    }
    out.push('}');
    out
}
