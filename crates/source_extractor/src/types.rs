//! Entities pulled out of a legacy agent program.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a tool parameter, as far as annotations or defaults reveal it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Unknown,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Unknown => "any",
        }
    }

    /// Infer from an annotation such as `str`, `Optional[int]`, `List[str]` or `dict | None`.
    pub fn from_annotation(annotation: &str) -> Self {
        let mut text = annotation.trim().trim_matches(|c| c == '"' || c == '\'').trim();

        if let Some(inner) = text
            .strip_prefix("Optional[")
            .or_else(|| text.strip_prefix("typing.Optional["))
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Self::from_annotation(inner);
        }
        if text.contains('|') {
            let arms: Vec<&str> = text
                .split('|')
                .map(str::trim)
                .filter(|arm| *arm != "None")
                .collect();
            if let [only] = arms.as_slice() {
                text = *only;
            } else {
                return ParamType::Unknown;
            }
        }

        let base = text.split('[').next().unwrap_or(text).trim();
        let base = base.rsplit('.').next().unwrap_or(base).to_ascii_lowercase();
        match base.as_str() {
            "str" => ParamType::String,
            "int" => ParamType::Integer,
            "float" | "decimal" => ParamType::Number,
            "bool" => ParamType::Boolean,
            "list" | "tuple" | "set" | "frozenset" | "sequence" | "iterable" => ParamType::Array,
            "dict" | "mapping" => ParamType::Object,
            _ => ParamType::Unknown,
        }
    }

    /// Infer from the node kind of a default value.
    pub fn from_default_kind(kind: &str) -> Self {
        match kind {
            "string" | "concatenated_string" => ParamType::String,
            "integer" => ParamType::Integer,
            "float" => ParamType::Number,
            "true" | "false" => ParamType::Boolean,
            "list" | "tuple" => ParamType::Array,
            "dictionary" => ParamType::Object,
            _ => ParamType::Unknown,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub has_default: bool,
}

/// A `@tool` function. `source` is the verbatim definition without tool decorators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub parameters: Vec<ToolParameter>,
    pub docstring: Option<String>,
    pub source: String,
    pub line: usize,
}

impl ToolDefinition {
    /// First docstring line, used as the one-line description.
    pub fn summary(&self) -> Option<&str> {
        self.docstring
            .as_deref()
            .and_then(|doc| doc.lines().map(str::trim).find(|line| !line.is_empty()))
    }
}

/// The two tokens that stay substitutable after rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placeholder {
    ToolDescriptions,
    CurrentDate,
}

impl Placeholder {
    pub const ALL: [Placeholder; 2] = [Placeholder::ToolDescriptions, Placeholder::CurrentDate];

    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::ToolDescriptions => "tool_descriptions",
            Placeholder::CurrentDate => "current_date",
        }
    }

    /// Substitutable form, e.g. `{tool_descriptions}`.
    pub fn token(&self) -> String {
        format!("{{{}}}", self.name())
    }

    pub fn found_in(text: &str) -> Vec<Placeholder> {
        Self::ALL
            .into_iter()
            .filter(|p| text.contains(&p.token()))
            .collect()
    }
}

/// Which extraction strategy produced the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptSource {
    Assignment { name: String },
    AgentBuilder { function: String, indirect: Option<String> },
    MessagesBuilder { function: String, indirect: Option<String> },
    Fallback,
}

impl fmt::Display for PromptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptSource::Assignment { name } => write!(f, "assignment to {}", name),
            PromptSource::AgentBuilder { function, indirect } => match indirect {
                Some(var) => write!(f, "{}(prompt={})", function, var),
                None => write!(f, "{}(prompt=...)", function),
            },
            PromptSource::MessagesBuilder { function, indirect } => match indirect {
                Some(var) => write!(f, "{}([(\"system\", {}), ...])", function, var),
                None => write!(f, "{}([(\"system\", ...), ...])", function),
            },
            PromptSource::Fallback => f.write_str("default prompt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub raw: String,
    pub placeholders: Vec<Placeholder>,
    pub source: PromptSource,
}

impl PromptTemplate {
    pub fn new(raw: impl Into<String>, source: PromptSource) -> Self {
        let raw = raw.into();
        Self {
            placeholders: Placeholder::found_in(&raw),
            raw,
            source,
        }
    }
}

/// Outcome of one prompt strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptLookup {
    Found(PromptTemplate),
    NotFound,
}

impl PromptLookup {
    pub fn into_option(self) -> Option<PromptTemplate> {
        match self {
            PromptLookup::Found(prompt) => Some(prompt),
            PromptLookup::NotFound => None,
        }
    }
}

/// The "read input from file" function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryHelper {
    pub name: String,
    pub source: String,
}

/// A recognized top-level mutable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    pub name: String,
    /// Whole assignment statement, verbatim.
    pub source: String,
    /// Right-hand side expression, verbatim.
    pub initial_value: String,
}

/// A top-level import that does not belong to the orchestration framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarriedImport {
    pub statement: String,
    pub is_future: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportKind {
    Function,
    Constant,
}

/// A non-tool definition that some tool depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportDefinition {
    pub name: String,
    pub kind: SupportKind,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionWarning {
    PromptNotFound,
    DuplicateTool(String),
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::PromptNotFound => {
                f.write_str("no system prompt found, using the default prompt")
            }
            ExtractionWarning::DuplicateTool(name) => {
                write!(f, "tool '{}' is defined more than once, keeping the last", name)
            }
        }
    }
}

/// Everything extracted from one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionBundle {
    pub tools: Vec<ToolDefinition>,
    pub prompt: Option<PromptTemplate>,
    pub helper: Option<AuxiliaryHelper>,
    pub state: Vec<GlobalState>,
    pub imports: Vec<CarriedImport>,
    pub support: Vec<SupportDefinition>,
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractionBundle {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// The extracted prompt, or the generic default when none was found.
    pub fn prompt_or_default(&self) -> PromptTemplate {
        self.prompt
            .clone()
            .unwrap_or_else(|| PromptTemplate::new(crate::DEFAULT_SYSTEM_PROMPT, PromptSource::Fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_inference() {
        assert_eq!(ParamType::from_annotation("str"), ParamType::String);
        assert_eq!(ParamType::from_annotation("Optional[int]"), ParamType::Integer);
        assert_eq!(ParamType::from_annotation("typing.List[str]"), ParamType::Array);
        assert_eq!(ParamType::from_annotation("dict[str, Any]"), ParamType::Object);
        assert_eq!(ParamType::from_annotation("float | None"), ParamType::Number);
        assert_eq!(ParamType::from_annotation("int | str"), ParamType::Unknown);
        assert_eq!(ParamType::from_annotation("'bool'"), ParamType::Boolean);
        assert_eq!(ParamType::from_annotation("Any"), ParamType::Unknown);
        assert_eq!(ParamType::from_annotation("MyModel"), ParamType::Unknown);
    }

    #[test]
    fn test_placeholder_tokens() {
        assert_eq!(Placeholder::ToolDescriptions.token(), "{tool_descriptions}");
        let found = Placeholder::found_in("Today is {current_date}.");
        assert_eq!(found, vec![Placeholder::CurrentDate]);
    }

    #[test]
    fn test_summary_skips_blank_lines() {
        let tool = ToolDefinition {
            name: "t".to_string(),
            parameters: vec![],
            docstring: Some("\n  Look things up.\nMore detail.".to_string()),
            source: String::new(),
            line: 1,
        };
        assert_eq!(tool.summary(), Some("Look things up."));
    }
}
