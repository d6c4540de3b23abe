//! Tool function discovery.

use log::{debug, warn};
use tree_sitter::Node;

use crate::config::ExtractionConfig;
use crate::literal::{clean_docstring, string_value};
use crate::module::{SourceModule, callee_name, named_children, statement_expression};
use crate::types::{ExtractionWarning, ParamType, ToolDefinition, ToolParameter};

/// Decorators of a `decorated_definition`, split into tool markers and the rest.
pub(crate) struct Decorators<'t> {
    pub markers: Vec<Node<'t>>,
    pub others: Vec<Node<'t>>,
}

pub(crate) fn split_decorators<'t>(
    module: &SourceModule,
    decorated: Node<'t>,
    cfg: &ExtractionConfig,
) -> Decorators<'t> {
    let mut markers = Vec::new();
    let mut others = Vec::new();
    for decorator in named_children(decorated)
        .into_iter()
        .filter(|n| n.kind() == "decorator")
    {
        let is_marker = named_children(decorator)
            .first()
            .and_then(|expr| callee_name(module, *expr))
            .is_some_and(|name| cfg.is_tool_decorator(name));
        if is_marker {
            markers.push(decorator);
        } else {
            others.push(decorator);
        }
    }
    Decorators { markers, others }
}

/// Top-level `@tool` functions in source order. A repeated name replaces the
/// earlier definition, matching Python rebinding.
pub fn extract_tools(
    module: &SourceModule,
    cfg: &ExtractionConfig,
    warnings: &mut Vec<ExtractionWarning>,
) -> Vec<ToolDefinition> {
    let mut tools: Vec<ToolDefinition> = Vec::new();

    for statement in module.statements() {
        if statement.kind() != "decorated_definition" {
            continue;
        }
        let Some(definition) = statement.child_by_field_name("definition") else {
            continue;
        };
        if definition.kind() != "function_definition" {
            continue;
        }
        let decorators = split_decorators(module, statement, cfg);
        if decorators.markers.is_empty() {
            continue;
        }

        let Some(tool) = build_tool(module, definition, &decorators.others) else {
            continue;
        };
        debug!("Found tool {} at line {}", tool.name, tool.line);

        match tools.iter().position(|t| t.name == tool.name) {
            Some(idx) => {
                warn!("Tool {} defined again at line {}", tool.name, tool.line);
                warnings.push(ExtractionWarning::DuplicateTool(tool.name.clone()));
                tools.remove(idx);
                tools.push(tool);
            }
            None => tools.push(tool),
        }
    }

    tools
}

fn build_tool(
    module: &SourceModule,
    definition: Node<'_>,
    kept_decorators: &[Node<'_>],
) -> Option<ToolDefinition> {
    let name = module
        .node_text(definition.child_by_field_name("name")?)
        .to_string();

    let parameters = definition
        .child_by_field_name("parameters")
        .map(|params| extract_parameters(module, params))
        .unwrap_or_default();

    let docstring = definition
        .child_by_field_name("body")
        .and_then(|body| docstring(module, body));

    let mut source = String::new();
    for decorator in kept_decorators {
        source.push_str(module.node_text(*decorator));
        source.push('\n');
    }
    source.push_str(module.node_text(definition));

    Some(ToolDefinition {
        name,
        parameters,
        docstring,
        source,
        line: definition.start_position().row + 1,
    })
}

fn extract_parameters(module: &SourceModule, params: Node<'_>) -> Vec<ToolParameter> {
    let mut out = Vec::new();

    for param in named_children(params) {
        let parsed = match param.kind() {
            "identifier" => Some((module.node_text(param), ParamType::Unknown, false)),
            "typed_parameter" => {
                let target = named_children(param).into_iter().next();
                match target {
                    Some(ident) if ident.kind() == "identifier" => {
                        let ty = param
                            .child_by_field_name("type")
                            .map(|t| ParamType::from_annotation(module.node_text(t)))
                            .unwrap_or(ParamType::Unknown);
                        Some((module.node_text(ident), ty, false))
                    }
                    // *args: T and **kwargs: T
                    _ => None,
                }
            }
            "default_parameter" => {
                let name = param.child_by_field_name("name");
                let ty = param
                    .child_by_field_name("value")
                    .map(|v| ParamType::from_default_kind(v.kind()))
                    .unwrap_or(ParamType::Unknown);
                name.map(|n| (module.node_text(n), ty, true))
            }
            "typed_default_parameter" => {
                let name = param.child_by_field_name("name");
                let annotated = param
                    .child_by_field_name("type")
                    .map(|t| ParamType::from_annotation(module.node_text(t)))
                    .unwrap_or(ParamType::Unknown);
                let ty = match annotated {
                    ParamType::Unknown => param
                        .child_by_field_name("value")
                        .map(|v| ParamType::from_default_kind(v.kind()))
                        .unwrap_or(ParamType::Unknown),
                    known => known,
                };
                name.map(|n| (module.node_text(n), ty, true))
            }
            _ => None,
        };

        if let Some((name, param_type, has_default)) = parsed {
            if name == "self" || name == "cls" {
                continue;
            }
            out.push(ToolParameter {
                name: name.to_string(),
                param_type,
                has_default,
            });
        }
    }

    out
}

/// Docstring of a function body block, cleaned.
pub(crate) fn docstring(module: &SourceModule, body: Node<'_>) -> Option<String> {
    let first = named_children(body).into_iter().next()?;
    let expr = statement_expression(first)?;
    let raw = string_value(module, expr)?;
    let cleaned = clean_docstring(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}
