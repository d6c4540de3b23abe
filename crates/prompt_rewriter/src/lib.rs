//! Turns an extracted system prompt into a deferred template: a fresh tools
//! section, the response protocol directive, and brace escaping so that only
//! `{tool_descriptions}` and `{current_date}` stay substitutable.

pub mod directive;
pub mod escape;
pub mod section;

use log::debug;
use serde::Serialize;

pub use directive::protocol_directive;
pub use escape::{escape_all, make_deferred, unescape_placeholders};
pub use section::{SectionEdit, insert_tools_section, placeholder_block};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenPrompt {
    /// Template text, safe for `str.format(tool_descriptions=..., current_date=...)`.
    pub template: String,
    pub section: SectionEdit,
}

pub fn rewrite_prompt(raw: &str, tool_names: &[&str]) -> RewrittenPrompt {
    let (with_section, section) = insert_tools_section(raw);
    debug!("Tools section: {:?}", section);

    let mut combined = with_section.trim_end().to_string();
    combined.push_str("\n\n");
    combined.push_str(&protocol_directive(tool_names));

    RewrittenPrompt {
        template: make_deferred(&combined),
        section,
    }
}
