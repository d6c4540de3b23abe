//! System prompt location strategies.
//!
//! Each strategy is a pure function over the parsed module. They run in a fixed
//! order and the first `Found` wins.

use log::debug;
use tree_sitter::Node;

use crate::config::ExtractionConfig;
use crate::literal::string_value;
use crate::module::{SourceModule, callee_name, descendants_of_kind, named_children};
use crate::types::{PromptLookup, PromptSource, PromptTemplate};

pub type PromptStrategy = fn(&SourceModule, &ExtractionConfig) -> PromptLookup;

/// Strategies in priority order.
pub const STRATEGIES: [(&str, PromptStrategy); 3] = [
    ("assignment", from_assignment),
    ("agent builder", from_agent_builder),
    ("messages builder", from_messages_builder),
];

/// Run the strategies in order; `None` when all of them miss.
pub fn locate_prompt(module: &SourceModule, cfg: &ExtractionConfig) -> Option<PromptTemplate> {
    STRATEGIES.iter().find_map(|(label, strategy)| {
        let found = strategy(module, cfg).into_option();
        if let Some(prompt) = &found {
            debug!("Prompt located by {} strategy ({})", label, prompt.source);
        }
        found
    })
}

/// `name = "literal"` anywhere in the module.
struct StringAssignment {
    name: String,
    value: String,
    start: usize,
}

fn string_assignments(module: &SourceModule) -> Vec<StringAssignment> {
    descendants_of_kind(module.root(), "assignment")
        .into_iter()
        .filter_map(|assignment| {
            let left = assignment.child_by_field_name("left")?;
            if left.kind() != "identifier" {
                return None;
            }
            let value = string_value(module, assignment.child_by_field_name("right")?)?;
            Some(StringAssignment {
                name: module.node_text(left).to_string(),
                value,
                start: assignment.start_byte(),
            })
        })
        .collect()
}

/// Literal value of `node`, following one identifier indirection. Returns the
/// value and the variable name when a lookup was needed.
fn resolve_string(
    module: &SourceModule,
    node: Node<'_>,
    assignments: &[StringAssignment],
) -> Option<(String, Option<String>)> {
    if let Some(value) = string_value(module, node) {
        return Some((value, None));
    }
    if node.kind() != "identifier" {
        return None;
    }

    let name = module.node_text(node);
    let candidates: Vec<&StringAssignment> =
        assignments.iter().filter(|a| a.name == name).collect();
    let chosen = candidates
        .iter()
        .rev()
        .find(|a| a.start < node.start_byte())
        .or_else(|| candidates.first())?;
    Some((chosen.value.clone(), Some(name.to_string())))
}

/// Strategy 1: a recognized prompt variable assigned a literal.
pub fn from_assignment(module: &SourceModule, cfg: &ExtractionConfig) -> PromptLookup {
    let assignments = string_assignments(module);
    for wanted in &cfg.prompt_names {
        if let Some(found) = assignments.iter().find(|a| &a.name == wanted) {
            return PromptLookup::Found(PromptTemplate::new(
                found.value.clone(),
                PromptSource::Assignment {
                    name: found.name.clone(),
                },
            ));
        }
    }
    PromptLookup::NotFound
}

/// Strategy 2: `create_react_agent(..., prompt=...)`.
pub fn from_agent_builder(module: &SourceModule, cfg: &ExtractionConfig) -> PromptLookup {
    let assignments = string_assignments(module);

    for call in descendants_of_kind(module.root(), "call") {
        let Some(function) = callee_name(module, call) else {
            continue;
        };
        if !cfg.agent_builders.iter().any(|b| b == function) {
            continue;
        }
        let Some(arguments) = call.child_by_field_name("arguments") else {
            continue;
        };

        for keyword in named_children(arguments)
            .into_iter()
            .filter(|a| a.kind() == "keyword_argument")
        {
            let (Some(name), Some(value)) = (
                keyword.child_by_field_name("name"),
                keyword.child_by_field_name("value"),
            ) else {
                continue;
            };
            if !cfg.prompt_keywords.iter().any(|k| k == module.node_text(name)) {
                continue;
            }
            if let Some((text, indirect)) = resolve_string(module, value, &assignments) {
                return PromptLookup::Found(PromptTemplate::new(
                    text,
                    PromptSource::AgentBuilder {
                        function: function.to_string(),
                        indirect,
                    },
                ));
            }
        }
    }
    PromptLookup::NotFound
}

/// Strategy 3: `ChatPromptTemplate.from_messages([("system", ...), ...])`.
pub fn from_messages_builder(module: &SourceModule, cfg: &ExtractionConfig) -> PromptLookup {
    let assignments = string_assignments(module);

    for call in descendants_of_kind(module.root(), "call") {
        let Some(function) = callee_name(module, call) else {
            continue;
        };
        if !cfg.message_builders.iter().any(|b| b == function) {
            continue;
        }
        let Some(messages) = call
            .child_by_field_name("arguments")
            .and_then(|args| {
                named_children(args)
                    .into_iter()
                    .find(|a| a.kind() != "keyword_argument")
            })
            .filter(|first| first.kind() == "list")
        else {
            continue;
        };

        for element in named_children(messages) {
            let Some(content) = system_content(module, element, cfg) else {
                continue;
            };
            if let Some((text, indirect)) = resolve_string(module, content, &assignments) {
                return PromptLookup::Found(PromptTemplate::new(
                    text,
                    PromptSource::MessagesBuilder {
                        function: function.to_string(),
                        indirect,
                    },
                ));
            }
        }
    }
    PromptLookup::NotFound
}

/// Content node of a system message element: a `("system", x)` pair or a
/// `SystemMessage(content=x)` construction.
fn system_content<'t>(
    module: &SourceModule,
    element: Node<'t>,
    cfg: &ExtractionConfig,
) -> Option<Node<'t>> {
    match element.kind() {
        "tuple" | "list" => match named_children(element).as_slice() {
            [role, content] => {
                (string_value(module, *role).as_deref() == Some("system")).then_some(*content)
            }
            _ => None,
        },
        "call" => {
            let class = callee_name(module, element)?;
            if !cfg.system_message_classes.iter().any(|c| c == class) {
                return None;
            }
            let args = named_children(element.child_by_field_name("arguments")?);
            let keyword = args.iter().find_map(|arg| {
                let name = arg.child_by_field_name("name")?;
                (arg.kind() == "keyword_argument" && module.node_text(name) == "content")
                    .then(|| arg.child_by_field_name("value"))
                    .flatten()
            });
            keyword.or_else(|| args.into_iter().find(|a| a.kind() != "keyword_argument"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(source: &str) -> Option<PromptTemplate> {
        let module = SourceModule::parse(source).unwrap();
        locate_prompt(&module, &ExtractionConfig::default())
    }

    #[test]
    fn test_direct_assignment() {
        let prompt = locate("REACT_SYSTEM_PROMPT = \"You are a careful analyst.\"\n").unwrap();
        assert_eq!(prompt.raw, "You are a careful analyst.");
        assert_eq!(
            prompt.source,
            PromptSource::Assignment {
                name: "REACT_SYSTEM_PROMPT".to_string()
            }
        );
    }

    #[test]
    fn test_assignment_priority_follows_config_order() {
        let source = "PROMPT = \"generic\"\nSYSTEM_PROMPT = \"specific\"\n";
        assert_eq!(locate(source).unwrap().raw, "specific");
    }

    #[test]
    fn test_non_literal_assignment_ignored() {
        let source = "SYSTEM_PROMPT = load_prompt()\n";
        assert!(locate(source).is_none());
    }

    #[test]
    fn test_agent_builder_resolves_variable() {
        let source = r#"
from langgraph.prebuilt import create_react_agent

INSTRUCTIONS = """You plan trips.
Always check the weather first."""

def build(model, tools):
    return create_react_agent(model, tools, prompt=INSTRUCTIONS)
"#;
        let prompt = locate(source).unwrap();
        assert_eq!(prompt.raw, "You plan trips.\nAlways check the weather first.");
        assert_eq!(
            prompt.source,
            PromptSource::AgentBuilder {
                function: "create_react_agent".to_string(),
                indirect: Some("INSTRUCTIONS".to_string()),
            }
        );
    }

    #[test]
    fn test_agent_builder_inline_literal_and_qualified_name() {
        let source = "agent = prebuilt.create_react_agent(llm, tools=[], prompt=\"Be terse.\")\n";
        let prompt = locate(source).unwrap();
        assert_eq!(prompt.raw, "Be terse.");
        assert!(matches!(
            prompt.source,
            PromptSource::AgentBuilder { indirect: None, .. }
        ));
    }

    #[test]
    fn test_indirection_prefers_latest_preceding_assignment() {
        let source = r#"
TEXT = "first"
TEXT = "second"
agent = create_react_agent(llm, tools, prompt=TEXT)
TEXT = "after"
"#;
        assert_eq!(locate(source).unwrap().raw, "second");
    }

    #[test]
    fn test_messages_builder_system_pair() {
        let source = r#"
from langchain_core.prompts import ChatPromptTemplate

prompt = ChatPromptTemplate.from_messages([
    ("system", "You answer billing questions. Tools: {tool_descriptions}"),
    ("human", "{input}"),
    ("placeholder", "{agent_scratchpad}"),
])
"#;
        let prompt = locate(source).unwrap();
        assert_eq!(
            prompt.raw,
            "You answer billing questions. Tools: {tool_descriptions}"
        );
        assert_eq!(
            prompt.placeholders,
            vec![crate::types::Placeholder::ToolDescriptions]
        );
    }

    #[test]
    fn test_messages_builder_resolves_name_and_system_message() {
        let source = r#"
BASE = "Resolve tickets."
p1 = ChatPromptTemplate.from_messages([("human", "hi"), ("system", BASE)])
"#;
        let prompt = locate(source).unwrap();
        assert_eq!(prompt.raw, "Resolve tickets.");
        assert!(matches!(
            prompt.source,
            PromptSource::MessagesBuilder { indirect: Some(ref v), .. } if v == "BASE"
        ));

        let source = "p = ChatPromptTemplate.from_messages([SystemMessage(content=\"Sys text\")])\n";
        assert_eq!(locate(source).unwrap().raw, "Sys text");
    }

    #[test]
    fn test_strategy_order_assignment_first() {
        let source = r#"
SYSTEM_PROMPT = "from assignment"
agent = create_react_agent(llm, tools, prompt="from builder")
"#;
        assert_eq!(locate(source).unwrap().raw, "from assignment");
    }

    #[test]
    fn test_interpolated_prompt_falls_through() {
        let source = r#"
SYSTEM_PROMPT = f"You help {user_name} today."
agent = create_react_agent(llm, tools, prompt="Static builder prompt.")
"#;
        let prompt = locate(source).unwrap();
        assert_eq!(prompt.raw, "Static builder prompt.");
        assert!(matches!(prompt.source, PromptSource::AgentBuilder { .. }));

        assert!(locate("SYSTEM_PROMPT = f\"Hi {name}\"\n").is_none());
    }

    #[test]
    fn test_no_strategy_matches() {
        let source = "agent = create_react_agent(llm, tools)\nprint(agent)\n";
        assert!(locate(source).is_none());
    }
}
