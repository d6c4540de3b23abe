//! Cheap textual checks run before a file is parsed.

use regex::Regex;
use std::sync::LazyLock;

/// Class every converted program defines. Its presence marks a file as done.
pub const RUNTIME_CLASS_NAME: &str = "ReActRuntime";

static RUNTIME_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^class\s+{}\b", RUNTIME_CLASS_NAME)).expect("static pattern")
});

static FRAMEWORK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from|import)\s+lang(?:chain|graph)\w*|\bcreate_react_agent\b|^\s*@(?:\w+\.)*tool\b")
        .expect("static pattern")
});

/// True when the text already contains the generated runtime class.
pub fn is_already_converted(text: &str) -> bool {
    RUNTIME_CLASS_RE.is_match(text)
}

/// True when the text looks like a framework-based agent program.
pub fn needs_conversion(text: &str) -> bool {
    !is_already_converted(text) && FRAMEWORK_RE.is_match(text)
}
