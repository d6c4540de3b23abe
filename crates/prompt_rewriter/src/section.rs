//! Locating and replacing the "available tools" section of a prompt.

use serde::Serialize;
use source_extractor::Placeholder;

pub const TOOLS_HEADER: &str = "## Available Tools";
const TOOLS_PHRASE: &str = "available tools";

/// How the tools section was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionEdit {
    /// A header section was replaced up to the next header.
    ReplacedSpan,
    /// The phrase appeared only inside a line and was substituted in place.
    ReplacedInline,
    /// No section existed; the block was put in front.
    Prepended,
    /// The text already carried the tool descriptions placeholder.
    Kept,
}

/// `## Available Tools\n{tool_descriptions}\n`
pub fn placeholder_block() -> String {
    format!("{}\n{}\n", TOOLS_HEADER, Placeholder::ToolDescriptions.token())
}

/// Markdown header depth: `## Tools` is 2. `None` for non-header lines.
fn header_level(line: &str) -> Option<usize> {
    let level = line.trim_start().chars().take_while(|c| *c == '#').count();
    (level > 0).then_some(level)
}

/// Byte offsets and contents of each line, terminators included.
fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|line| {
            let start = offset;
            offset += line.len();
            (start, line)
        })
        .collect()
}

/// ASCII case-insensitive search; returns a byte offset into `haystack`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let lowered = haystack.to_ascii_lowercase();
    lowered.find(&needle.to_ascii_lowercase())
}

/// Put the tool descriptions placeholder block in place of any existing tools section.
pub fn insert_tools_section(raw: &str) -> (String, SectionEdit) {
    if raw.contains(&Placeholder::ToolDescriptions.token()) {
        return (raw.to_string(), SectionEdit::Kept);
    }

    let lines = lines_with_offsets(raw);
    let header = lines.iter().enumerate().find_map(|(idx, (_, line))| {
        let level = header_level(line)?;
        find_ignore_case(line, TOOLS_PHRASE).map(|_| (idx, level))
    });

    if let Some((idx, level)) = header {
        let start = lines[idx].0;
        // Sub-headers (deeper levels) belong to the tools section.
        let next = lines[idx + 1..]
            .iter()
            .find(|(_, line)| header_level(line).is_some_and(|l| l <= level))
            .map(|(offset, _)| *offset);

        let mut out = String::with_capacity(raw.len() + 32);
        out.push_str(&raw[..start]);
        out.push_str(&placeholder_block());
        if let Some(end) = next {
            out.push('\n');
            out.push_str(&raw[end..]);
        }
        return (out, SectionEdit::ReplacedSpan);
    }

    if let Some(pos) = find_ignore_case(raw, TOOLS_PHRASE) {
        let mut out = String::with_capacity(raw.len() + 32);
        out.push_str(&raw[..pos]);
        out.push_str(&placeholder_block());
        out.push_str(&raw[pos + TOOLS_PHRASE.len()..]);
        return (out, SectionEdit::ReplacedInline);
    }

    (
        format!("{}\n{}", placeholder_block(), raw),
        SectionEdit::Prepended,
    )
}
