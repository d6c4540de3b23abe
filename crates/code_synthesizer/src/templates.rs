//! Fixed Python text emitted into every converted program.
//!
//! The loop below mirrors `react_runtime::runtime::ReactRuntime::run`; the
//! constants it reads are generated from `react_runtime::protocol`.

pub const GENERATED_MARKER: &str =
    "# Converted by react-migrate: framework scaffolding replaced by a direct OpenAI-compatible client.";

pub const HEADER_DOCSTRING: &str =
    "\"\"\"ReAct agent driven directly against an OpenAI-compatible inference endpoint.\"\"\"";

/// Import lines the runtime itself needs, in emission order.
pub const FIXED_IMPORTS: [&str; 7] = [
    "import argparse",
    "import asyncio",
    "import copy",
    "import datetime as _datetime",
    "import inspect",
    "import json",
    "import re",
];

pub const CLIENT_IMPORT: &str = "from openai import OpenAI";

pub const DEFAULT_HELPER_NAME: &str = "read_input_file";

pub const DEFAULT_HELPER: &str = r#"def read_input_file(path):
    """Return the task text stored in `path`."""
    with open(path, "r", encoding="utf-8") as handle:
        return handle.read()"#;

pub const RESET_STATE_EMPTY: &str = r#"_INITIAL_STATE = {}


def _reset_state():
    """Restore module-level state to its declared initial values."""
    pass"#;

pub const RUNTIME: &str = r#"def _clean_action_input(raw):
    text = raw.split(OBSERVATION_LABEL)[0].strip()
    if text.startswith("```"):
        text = text[3:]
        if text.startswith("json"):
            text = text[4:]
        text = text.strip()
        if text.endswith("```"):
            text = text[:-3].strip()
    return text


def _tool_listing(names):
    return TOOL_NAME_SEPARATOR.join(names) if names else NO_TOOLS_LISTING


class ReActRuntime:
    """Reason-and-act loop: one completion per iteration, tools dispatched by name."""

    def __init__(self, client, model, tools=None, max_iterations=DEFAULT_MAX_ITERATIONS):
        self.client = client
        self.model = model
        self.tools = dict(TOOLS if tools is None else tools)
        self.max_iterations = max_iterations
        self._action_re = re.compile(ACTION_PATTERN)

    def system_prompt(self):
        return SYSTEM_PROMPT_TEMPLATE.format(
            tool_descriptions=TOOL_DESCRIPTIONS,
            current_date=_datetime.datetime.now().strftime("%Y-%m-%d"),
        )

    def _complete(self, messages):
        response = self.client.chat.completions.create(
            model=self.model,
            messages=messages,
            temperature=0,
        )
        return response.choices[0].message.content or ""

    def _dispatch(self, name, raw_input):
        tool = self.tools.get(name)
        if tool is None:
            return UNKNOWN_TOOL_MESSAGE.format(name=name, available=_tool_listing(list(self.tools)))
        try:
            arguments = json.loads(raw_input) if raw_input.strip() else {}
        except ValueError as exc:
            return MALFORMED_INPUT_MESSAGE.format(name=name, error=exc)
        if not isinstance(arguments, dict):
            return MALFORMED_INPUT_MESSAGE.format(name=name, error="expected a JSON object")
        try:
            result = tool(**arguments)
            if inspect.isawaitable(result):
                result = asyncio.run(result)
        except Exception as exc:
            return TOOL_FAILURE_MESSAGE.format(name=name, error=exc)
        return result if isinstance(result, str) else json.dumps(result, default=str)

    def run(self, task):
        messages = [
            {"role": "system", "content": self.system_prompt()},
            {"role": "user", "content": task},
        ]
        for _ in range(self.max_iterations):
            reply = self._complete(messages)
            if FINAL_ANSWER_MARKER in reply:
                return reply.split(FINAL_ANSWER_MARKER, 1)[1].strip()
            match = self._action_re.search(reply)
            name = match.group(1).strip() if match else ""
            if not name:
                return reply.strip()
            observation = self._dispatch(name, _clean_action_input(match.group(2)))
            messages.append({"role": "assistant", "content": reply})
            messages.append({"role": "user", "content": f"{OBSERVATION_LABEL} {observation}"})
        return BUDGET_EXHAUSTED_MESSAGE


def init_client(base_url=DEFAULT_BASE_URL, api_key=DEFAULT_API_KEY):
    """Client for an OpenAI-compatible inference server."""
    return OpenAI(base_url=base_url, api_key=api_key)


def parse_args(argv=None):
    parser = argparse.ArgumentParser(
        description="Run the ReAct agent against an OpenAI-compatible endpoint."
    )
    parser.add_argument("--model", default=DEFAULT_MODEL, help="model identifier served by the endpoint")
    parser.add_argument("--base-url", default=DEFAULT_BASE_URL, help="inference server base URL")
    parser.add_argument("--api-key", default=DEFAULT_API_KEY, help="credential token")
    parser.add_argument("--input-file", required=True, help="file holding the task text")
    parser.add_argument(
        "--max-iterations",
        type=int,
        default=DEFAULT_MAX_ITERATIONS,
        help="iteration budget before the agent gives up",
    )
    return parser.parse_args(argv)


def _print_state():
    for name in _INITIAL_STATE:
        print(f"{name}: {json.dumps(globals()[name], indent=2, default=str)}")"#;

/// Entry point calling the given read helper.
pub fn main_function(helper: &str) -> String {
    format!(
        r#"def main():
    args = parse_args()
    _reset_state()
    try:
        task = {helper}(args.input_file)
        client = init_client(args.base_url, args.api_key)
        runtime = ReActRuntime(client, args.model, max_iterations=args.max_iterations)
        result = runtime.run(task)
    except Exception as exc:
        print(f"Error: {{exc}}")
        return
    print(result)
    _print_state()


if __name__ == "__main__":
    main()
"#
    )
}
