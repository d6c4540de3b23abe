//! Non-tool entities carried into the generated program: the read helper,
//! outcome-tracking globals, plain imports and the definitions tools rely on.

use std::collections::BTreeSet;
use tree_sitter::Node;

use crate::config::ExtractionConfig;
use crate::module::{SourceModule, descendants_of_kind, statement_expression};
use crate::tools::split_decorators;
use crate::types::{
    AuxiliaryHelper, CarriedImport, GlobalState, SupportDefinition, SupportKind, ToolDefinition,
};

/// A top-level function, looking through decorators.
struct TopLevelFunction<'t> {
    name: String,
    /// The statement node, decorators included.
    statement: Node<'t>,
    is_tool: bool,
}

fn top_level_functions<'t>(
    module: &'t SourceModule,
    cfg: &ExtractionConfig,
) -> Vec<TopLevelFunction<'t>> {
    let mut out = Vec::new();
    for statement in module.statements() {
        let (definition, is_tool) = match statement.kind() {
            "function_definition" => (statement, false),
            "decorated_definition" => {
                let Some(definition) = statement.child_by_field_name("definition") else {
                    continue;
                };
                let is_tool = !split_decorators(module, statement, cfg).markers.is_empty();
                (definition, is_tool)
            }
            _ => continue,
        };
        if definition.kind() != "function_definition" {
            continue;
        }
        if let Some(name) = definition.child_by_field_name("name") {
            out.push(TopLevelFunction {
                name: module.node_text(name).to_string(),
                statement,
                is_tool,
            });
        }
    }
    out
}

/// First non-tool function named like `read*file*`.
pub fn extract_helper(module: &SourceModule, cfg: &ExtractionConfig) -> Option<AuxiliaryHelper> {
    top_level_functions(module, cfg)
        .into_iter()
        .find(|f| {
            !f.is_tool && f.name.starts_with(&cfg.read_helper_prefix) && f.name.contains("file")
        })
        .map(|f| AuxiliaryHelper {
            source: module.node_text(f.statement).to_string(),
            name: f.name,
        })
}

/// Top-level `NAME = value` statements for recognized state names.
pub fn extract_state(module: &SourceModule, cfg: &ExtractionConfig) -> Vec<GlobalState> {
    let mut out: Vec<GlobalState> = Vec::new();
    for statement in module.statements() {
        let Some(assignment) = statement_expression(statement).filter(|e| e.kind() == "assignment")
        else {
            continue;
        };
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            continue;
        };
        let name = module.node_text(left);
        if left.kind() != "identifier" || !cfg.state_names.iter().any(|s| s == name) {
            continue;
        }
        // A rebinding replaces the earlier declaration.
        out.retain(|s| s.name != name);
        out.push(GlobalState {
            name: name.to_string(),
            source: module.node_text(statement).to_string(),
            initial_value: module.node_text(right).to_string(),
        });
    }
    out
}

/// Top-level imports whose modules are not part of the orchestration framework.
pub fn extract_imports(module: &SourceModule, cfg: &ExtractionConfig) -> Vec<CarriedImport> {
    let mut out = Vec::new();
    for statement in module.statements() {
        let (roots, is_future) = match statement.kind() {
            "import_statement" => {
                let mut cursor = statement.walk();
                let names: Vec<Node<'_>> = statement
                    .children_by_field_name("name", &mut cursor)
                    .collect();
                let roots = names
                    .into_iter()
                    .map(|name| {
                        let dotted = match name.kind() {
                            "aliased_import" => name.child_by_field_name("name").unwrap_or(name),
                            _ => name,
                        };
                        module_root(module.node_text(dotted))
                    })
                    .collect::<Vec<_>>();
                (roots, false)
            }
            "import_from_statement" => {
                let Some(source) = statement.child_by_field_name("module_name") else {
                    continue;
                };
                if source.kind() == "relative_import" {
                    (Vec::new(), false)
                } else {
                    (vec![module_root(module.node_text(source))], false)
                }
            }
            "future_import_statement" => (Vec::new(), true),
            _ => continue,
        };

        if roots.iter().any(|root| cfg.is_framework_module(root)) {
            continue;
        }
        out.push(CarriedImport {
            statement: module.node_text(statement).to_string(),
            is_future,
        });
    }
    out
}

fn module_root(dotted: &str) -> String {
    dotted.split('.').next().unwrap_or(dotted).trim().to_string()
}

/// Value kinds that are safe to carry without evaluating framework code.
fn is_plain_value(kind: &str) -> bool {
    matches!(
        kind,
        "string"
            | "concatenated_string"
            | "integer"
            | "float"
            | "true"
            | "false"
            | "none"
            | "list"
            | "tuple"
            | "dictionary"
            | "set"
            | "unary_operator"
    )
}

fn identifiers_in(module: &SourceModule, node: Node<'_>, into: &mut BTreeSet<String>) {
    for ident in descendants_of_kind(node, "identifier") {
        into.insert(module.node_text(ident).to_string());
    }
}

/// Non-tool functions and plain constants that the carried code references,
/// directly or through each other. References are followed from tool bodies, the
/// read helper and state initializers. Prompt variables, state and the helper
/// itself are never candidates.
pub fn extract_support(
    module: &SourceModule,
    cfg: &ExtractionConfig,
    tools: &[ToolDefinition],
    helper: Option<&str>,
    excluded: &BTreeSet<String>,
) -> Vec<SupportDefinition> {
    struct Candidate<'t> {
        name: String,
        kind: SupportKind,
        statement: Node<'t>,
        start: usize,
    }

    let mut candidates: Vec<Candidate<'_>> = top_level_functions(module, cfg)
        .into_iter()
        .filter(|f| !f.is_tool && f.name != "main" && !excluded.contains(&f.name))
        .map(|f| Candidate {
            start: f.statement.start_byte(),
            name: f.name,
            kind: SupportKind::Function,
            statement: f.statement,
        })
        .collect();

    for statement in module.statements() {
        let Some(assignment) = statement_expression(statement).filter(|e| e.kind() == "assignment")
        else {
            continue;
        };
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            continue;
        };
        let name = module.node_text(left);
        if left.kind() != "identifier"
            || !is_plain_value(right.kind())
            || excluded.contains(name)
            || cfg.prompt_names.iter().any(|p| p == name)
            || cfg.state_names.iter().any(|s| s == name)
        {
            continue;
        }
        candidates.push(Candidate {
            name: name.to_string(),
            kind: SupportKind::Constant,
            statement,
            start: statement.start_byte(),
        });
    }

    let tool_names: BTreeSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    let mut referenced = BTreeSet::new();
    for function in top_level_functions(module, cfg)
        .into_iter()
        .filter(|f| f.is_tool || Some(f.name.as_str()) == helper)
    {
        identifiers_in(module, function.statement, &mut referenced);
    }
    for statement in module.statements() {
        let Some(assignment) = statement_expression(statement).filter(|e| e.kind() == "assignment")
        else {
            continue;
        };
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            continue;
        };
        if cfg.state_names.iter().any(|s| s == module.node_text(left)) {
            identifiers_in(module, right, &mut referenced);
        }
    }

    let mut chosen: BTreeSet<usize> = BTreeSet::new();
    loop {
        let newly: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(idx, c)| {
                !chosen.contains(idx)
                    && referenced.contains(&c.name)
                    && !tool_names.contains(c.name.as_str())
            })
            .map(|(idx, _)| idx)
            .collect();
        if newly.is_empty() {
            break;
        }
        for idx in newly {
            chosen.insert(idx);
            identifiers_in(module, candidates[idx].statement, &mut referenced);
        }
    }

    let mut picked: Vec<&Candidate<'_>> = chosen.iter().map(|idx| &candidates[*idx]).collect();
    picked.sort_by_key(|c| c.start);
    // Later rebindings of the same name win, as they would at import time.
    let mut out: Vec<SupportDefinition> = Vec::new();
    for candidate in picked {
        out.retain(|s| s.name != candidate.name);
        out.push(SupportDefinition {
            name: candidate.name.clone(),
            kind: candidate.kind,
            source: module.node_text(candidate.statement).to_string(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::extract_tools;

    const SOURCE: &str = r#"
from __future__ import annotations
import os, json
import requests as rq
from pathlib import Path
from . import local_utils
from langchain_core.tools import tool
from langgraph.prebuilt import create_react_agent
import openai
from dotenv import load_dotenv

load_dotenv()

FINAL_RESULT = {"status": None, "answer": None}
OUTCOME: dict = {}
BASE_URL = "https://api.example.com"
RETRIES = 3
llm = ChatOpenAI(model="gpt-4o")
UNUSED = 10

def _headers():
    return {"Authorization": os.environ.get("TOKEN", "")}

def _fetch(path):
    return rq.get(BASE_URL + path, headers=_headers(), timeout=RETRIES)

@tool
def lookup(path: str) -> str:
    """Fetch a resource."""
    FINAL_RESULT["status"] = "fetched"
    return _fetch(path).text

@tool
def read_file_tool(name: str) -> str:
    """Looks like a helper but is a tool."""
    return Path(name).read_text()

def read_task_file(path):
    with open(path) as fh:
        return fh.read()

def read_other_file(path):
    return ""

def main():
    agent = create_react_agent(llm, [lookup])
"#;

    fn module() -> SourceModule {
        SourceModule::parse(SOURCE).unwrap()
    }

    #[test]
    fn test_helper_skips_tools_and_takes_first() {
        let module = module();
        let helper = extract_helper(&module, &ExtractionConfig::default()).unwrap();
        assert_eq!(helper.name, "read_task_file");
        assert!(helper.source.starts_with("def read_task_file(path):"));
    }

    #[test]
    fn test_no_helper() {
        let module = SourceModule::parse("def load(path):\n    pass\n").unwrap();
        assert!(extract_helper(&module, &ExtractionConfig::default()).is_none());
    }

    #[test]
    fn test_state_declarations_captured_verbatim() {
        let module = module();
        let state = extract_state(&module, &ExtractionConfig::default());
        assert_eq!(state.len(), 2);
        assert_eq!(state[0].name, "FINAL_RESULT");
        assert_eq!(state[0].source, "FINAL_RESULT = {\"status\": None, \"answer\": None}");
        assert_eq!(state[0].initial_value, "{\"status\": None, \"answer\": None}");
        assert_eq!(state[1].name, "OUTCOME");
        assert_eq!(state[1].source, "OUTCOME: dict = {}");
    }

    #[test]
    fn test_framework_imports_dropped() {
        let module = module();
        let imports = extract_imports(&module, &ExtractionConfig::default());
        let statements: Vec<_> = imports.iter().map(|i| i.statement.as_str()).collect();
        assert_eq!(
            statements,
            vec![
                "from __future__ import annotations",
                "import os, json",
                "import requests as rq",
                "from pathlib import Path",
                "from . import local_utils",
            ]
        );
        assert!(imports[0].is_future);
        assert!(!imports[1].is_future);
    }

    #[test]
    fn test_support_follows_references_transitively() {
        let module = module();
        let cfg = ExtractionConfig::default();
        let mut warnings = Vec::new();
        let tools = extract_tools(&module, &cfg, &mut warnings);
        let excluded: BTreeSet<String> = ["read_task_file".to_string()].into_iter().collect();
        let support = extract_support(&module, &cfg, &tools, None, &excluded);
        let names: Vec<_> = support.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["BASE_URL", "RETRIES", "_headers", "_fetch"]);
        assert_eq!(support[0].kind, SupportKind::Constant);
        assert_eq!(support[3].kind, SupportKind::Function);
    }

    #[test]
    fn test_support_follows_helper_and_state_references() {
        let source = r#"
from langchain_core.tools import tool

INPUT_DIR = "tasks"
EMPTY_ANSWER = None
SUFFIX = ".txt"

def _normalize(text):
    return text.strip() + SUFFIX

FINAL_RESULT = {"answer": EMPTY_ANSWER}

@tool
def echo(text: str) -> str:
    """Echo."""
    return text

def read_task_file(name):
    with open(INPUT_DIR + "/" + name) as fh:
        return _normalize(fh.read())
"#;
        let module = SourceModule::parse(source).unwrap();
        let cfg = ExtractionConfig::default();
        let tools = extract_tools(&module, &cfg, &mut Vec::new());
        let excluded: BTreeSet<String> = ["read_task_file".to_string()].into_iter().collect();

        let support = extract_support(&module, &cfg, &tools, Some("read_task_file"), &excluded);
        let names: Vec<_> = support.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["INPUT_DIR", "EMPTY_ANSWER", "SUFFIX", "_normalize"]);

        let without_helper = extract_support(&module, &cfg, &tools, None, &excluded);
        let names: Vec<_> = without_helper.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["EMPTY_ANSWER"]);
    }
}
