use code_synthesizer::{GenerationConfig, SynthesisError, synthesize};
use prompt_rewriter::{RewrittenPrompt, SectionEdit, rewrite_prompt};
use react_runtime::protocol;
use source_extractor::{
    ExtractionBundle, ExtractionConfig, SourceModule, extract, is_already_converted,
    needs_conversion,
};

const WEATHER_AGENT: &str = r#"
import json
import requests
from langchain_core.tools import tool
from langchain_openai import ChatOpenAI
from langgraph.prebuilt import create_react_agent

REACT_SYSTEM_PROMPT = """You are a weather assistant.

## Available Tools
- get_weather: current conditions

## Output
Reply with {"city": "...", "summary": "..."}.
"""

FINAL_RESULT = {"city": None}

UNITS = "metric"


@tool
def get_weather(city: str) -> str:
    """Current conditions for a city."""
    FINAL_RESULT["city"] = city
    return json.dumps({"city": city, "units": UNITS})


@tool
def get_forecast(city: str, days: int = 3) -> str:
    """Multi-day forecast."""
    return f"{days} days of sun in {city}"


def read_query_file(path):
    with open(path) as fh:
        return fh.read()


def main():
    llm = ChatOpenAI(model="gpt-4o")
    agent = create_react_agent(llm, [get_weather, get_forecast], prompt=REACT_SYSTEM_PROMPT)
    print(agent.invoke({"messages": [("user", read_query_file("q.txt"))]}))


if __name__ == "__main__":
    main()
"#;

fn convert(source: &str) -> (ExtractionBundle, code_synthesizer::GeneratedModule) {
    let module = SourceModule::parse(source).unwrap();
    let bundle = extract(&module, &ExtractionConfig::default());
    let prompt = bundle.prompt_or_default();
    let rewritten = rewrite_prompt(&prompt.raw, &bundle.tool_names());
    let generated = synthesize(&bundle, &rewritten, &GenerationConfig::default()).unwrap();
    (bundle, generated)
}

#[test]
fn test_dispatch_keys_match_extracted_tools() {
    let (bundle, generated) = convert(WEATHER_AGENT);
    let names: Vec<String> = bundle.tools.iter().map(|t| t.name.clone()).collect();
    assert_eq!(generated.dispatch_keys, names);
    assert!(generated.text.contains(
        "TOOLS = {\n    \"get_weather\": get_weather,\n    \"get_forecast\": get_forecast,\n}"
    ));
}

#[test]
fn test_output_is_valid_and_marked() {
    let (_, generated) = convert(WEATHER_AGENT);
    assert!(SourceModule::parse(generated.text.as_str()).is_ok());
    assert!(is_already_converted(&generated.text));
    assert!(!needs_conversion(&generated.text));
    assert!(!generated.text.contains("langchain"));
    assert!(!generated.text.contains("@tool"));
}

#[test]
fn test_domain_code_carried_verbatim() {
    let (_, generated) = convert(WEATHER_AGENT);
    let text = &generated.text;
    assert!(text.contains("def get_forecast(city: str, days: int = 3) -> str:\n    \"\"\"Multi-day forecast.\"\"\"\n    return f\"{days} days of sun in {city}\""));
    assert!(text.contains("def read_query_file(path):"));
    assert!(text.contains("task = read_query_file(args.input_file)"));
    assert!(text.contains("UNITS = \"metric\""));
    assert!(text.contains("import requests"));
    assert_eq!(text.matches("\nimport json\n").count(), 1);
}

#[test]
fn test_state_reset_emitted() {
    let (_, generated) = convert(WEATHER_AGENT);
    let text = &generated.text;
    assert!(text.contains("FINAL_RESULT = {\"city\": None}\n"));
    assert!(text.contains("    \"FINAL_RESULT\": copy.deepcopy(FINAL_RESULT),"));
    assert!(text.contains("    global FINAL_RESULT\n"));
    assert!(text.contains("    FINAL_RESULT = copy.deepcopy(_INITIAL_STATE[\"FINAL_RESULT\"])"));
}

#[test]
fn test_prompt_literal_braces_escaped() {
    let (_, generated) = convert(WEATHER_AGENT);
    let text = &generated.text;
    assert!(text.contains(r#"Reply with {{"city": "...", "summary": "..."}}."#));
    assert!(text.contains("## Available Tools\n{tool_descriptions}\n"));
    assert!(!text.contains("current conditions\n"));
    assert!(text.contains("Available tool names: get_weather, get_forecast"));
    assert!(text.contains(
        "TOOL_DESCRIPTIONS = \"\"\"- get_weather(city: string): Current conditions for a city.\n- get_forecast(city: string, days: integer): Multi-day forecast.\"\"\""
    ));
}

#[test]
fn test_protocol_constants_emitted() {
    let (_, generated) = convert(WEATHER_AGENT);
    let text = &generated.text;
    assert!(text.contains("FINAL_ANSWER_MARKER = \"Final Answer:\"\n"));
    assert!(text.contains("DEFAULT_MAX_ITERATIONS = 10\n"));
    assert!(text.contains("DEFAULT_API_KEY = \"EMPTY\"\n"));
    assert!(text.contains("ACTION_PATTERN = r\"(?s)Action:"));
    assert!(text.contains("parser.add_argument(\"--input-file\", required=True"));
}

#[test]
fn test_python_loop_mirrors_runtime_branches() {
    let (_, generated) = convert(WEATHER_AGENT);
    let text = &generated.text;

    // Message constants carry the same text the Rust registry produces.
    for (name, value) in [
        ("UNKNOWN_TOOL_MESSAGE", protocol::UNKNOWN_TOOL_MESSAGE),
        ("MALFORMED_INPUT_MESSAGE", protocol::MALFORMED_INPUT_MESSAGE),
        ("TOOL_FAILURE_MESSAGE", protocol::TOOL_FAILURE_MESSAGE),
        ("BUDGET_EXHAUSTED_MESSAGE", protocol::BUDGET_EXHAUSTED_MESSAGE),
    ] {
        let line = format!("{} = \"{}\"\n", name, value);
        assert!(text.contains(&line), "missing {}", line);
    }

    // Unknown tool, bad arguments and tool errors become observations.
    assert!(text.contains(
        "            return UNKNOWN_TOOL_MESSAGE.format(name=name, available=_tool_listing(list(self.tools)))\n"
    ));
    assert!(text.contains("            return MALFORMED_INPUT_MESSAGE.format(name=name, error=exc)\n"));
    assert!(text.contains(
        "            return MALFORMED_INPUT_MESSAGE.format(name=name, error=\"expected a JSON object\")\n"
    ));
    assert!(text.contains("            return TOOL_FAILURE_MESSAGE.format(name=name, error=exc)\n"));

    // One completion per iteration, bounded by the budget.
    let loop_start = text.find("        for _ in range(self.max_iterations):\n").unwrap();
    let completion = text.find("            reply = self._complete(messages)\n").unwrap();
    let exhausted = text.find("        return BUDGET_EXHAUSTED_MESSAGE\n").unwrap();
    assert!(loop_start < completion && completion < exhausted);
    assert_eq!(text.matches("self._complete(messages)").count(), 1);

    // Terminal marker first, then action, otherwise the reply is the answer.
    let marker = text.find("            if FINAL_ANSWER_MARKER in reply:\n").unwrap();
    let action = text.find("            match = self._action_re.search(reply)\n").unwrap();
    let implicit = text.find("            if not name:\n                return reply.strip()\n").unwrap();
    assert!(marker < action && action < implicit);
}

#[test]
fn test_missing_prompt_degrades_to_default() {
    let source = "from langchain_core.tools import tool\n\n@tool\ndef ping() -> str:\n    return 'pong'\n";
    let (bundle, generated) = convert(source);
    assert!(bundle.prompt.is_none());
    assert!(generated.text.contains("You are a helpful assistant that solves tasks step by step"));
    assert!(generated.text.contains("def read_input_file(path):"));
    assert!(generated.text.contains("_INITIAL_STATE = {}"));
    assert_eq!(generated.dispatch_keys, vec!["ping".to_string()]);
}

#[test]
fn test_zero_tools_still_generates() {
    let source = "from langgraph.prebuilt import create_react_agent\nSYSTEM_PROMPT = 'Chat politely.'\n";
    let (_, generated) = convert(source);
    assert!(generated.dispatch_keys.is_empty());
    assert!(generated.text.contains("TOOLS = {}"));
    assert!(generated.text.contains("TOOL_DESCRIPTIONS = \"(none)\""));
    assert!(SourceModule::parse(generated.text.as_str()).is_ok());
}

#[test]
fn test_synthesis_is_deterministic() {
    let (_, first) = convert(WEATHER_AGENT);
    let (_, second) = convert(WEATHER_AGENT);
    assert_eq!(first, second);
}

#[test]
fn test_stray_placeholder_rejected() {
    let bundle = ExtractionBundle::default();
    let prompt = RewrittenPrompt {
        template: "Hello {user}".to_string(),
        section: SectionEdit::Kept,
    };
    let err = synthesize(&bundle, &prompt, &GenerationConfig::default()).unwrap_err();
    assert!(matches!(err, SynthesisError::UnknownPlaceholder(ref name) if name == "user"));

    let prompt = RewrittenPrompt {
        template: "unbalanced {".to_string(),
        section: SectionEdit::Kept,
    };
    let err = synthesize(&bundle, &prompt, &GenerationConfig::default()).unwrap_err();
    assert!(matches!(err, SynthesisError::Template(_)));
}

#[test]
fn test_generation_defaults_configurable() {
    let module = SourceModule::parse("SYSTEM_PROMPT = 'x'\n").unwrap();
    let bundle = extract(&module, &ExtractionConfig::default());
    let rewritten = rewrite_prompt("x", &[]);
    let cfg = GenerationConfig {
        default_model: "qwen2.5-7b-instruct".to_string(),
        default_base_url: "http://gpu-box:8000/v1".to_string(),
        default_api_key: "EMPTY".to_string(),
        max_iterations: 4,
    };
    let generated = synthesize(&bundle, &rewritten, &cfg).unwrap();
    assert!(generated.text.contains("DEFAULT_MODEL = \"qwen2.5-7b-instruct\""));
    assert!(generated.text.contains("DEFAULT_BASE_URL = \"http://gpu-box:8000/v1\""));
    assert!(generated.text.contains("DEFAULT_MAX_ITERATIONS = 4"));
}
