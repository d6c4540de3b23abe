use react_runtime::protocol::NO_TOOLS_LISTING;
use source_extractor::ToolDefinition;

pub const NO_DESCRIPTION: &str = "No description provided.";

/// `- name(param: type, ...): summary`
pub fn describe_tool(tool: &ToolDefinition) -> String {
    let params = tool
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.param_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "- {}({}): {}",
        tool.name,
        params,
        tool.summary().unwrap_or(NO_DESCRIPTION)
    )
}

/// The text substituted for `{tool_descriptions}`, one line per tool.
pub fn tool_descriptions(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return NO_TOOLS_LISTING.to_string();
    }
    tools.iter().map(describe_tool).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_extractor::{ParamType, ToolParameter};

    fn tool(name: &str, params: &[(&str, ParamType)], doc: Option<&str>) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            parameters: params
                .iter()
                .map(|(n, t)| ToolParameter {
                    name: n.to_string(),
                    param_type: *t,
                    has_default: false,
                })
                .collect(),
            docstring: doc.map(str::to_string),
            source: String::new(),
            line: 1,
        }
    }

    #[test]
    fn test_description_lines() {
        let tools = vec![
            tool(
                "get_weather",
                &[("city", ParamType::String), ("days", ParamType::Integer)],
                Some("Forecast for a city.\n\nLonger text."),
            ),
            tool("ping", &[], None),
        ];
        assert_eq!(
            tool_descriptions(&tools),
            "- get_weather(city: string, days: integer): Forecast for a city.\n- ping(): No description provided."
        );
    }

    #[test]
    fn test_no_tools() {
        assert_eq!(tool_descriptions(&[]), "(none)");
    }
}
