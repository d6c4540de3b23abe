//! Brace escaping for deferred `str.format` substitution.

use source_extractor::Placeholder;

/// Double every brace so the text renders back to itself.
pub fn escape_all(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            _ => out.push(c),
        }
    }
    out
}

/// Re-expose the recognized placeholders after [`escape_all`].
pub fn unescape_placeholders(text: &str) -> String {
    Placeholder::ALL.iter().fold(text.to_string(), |acc, placeholder| {
        let escaped = format!("{{{{{}}}}}", placeholder.name());
        acc.replace(&escaped, &placeholder.token())
    })
}

/// Both passes, in the only order that is safe.
pub fn make_deferred(text: &str) -> String {
    unescape_placeholders(&escape_all(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use react_runtime::render_template;

    fn render(template: &str) -> String {
        render_template(
            template,
            &[("tool_descriptions", "TOOLS"), ("current_date", "2024-01-31")],
        )
        .unwrap()
    }

    #[test]
    fn test_escape_doubles_all_braces() {
        assert_eq!(escape_all("{a} }{"), "{{a}} }}{{");
    }

    #[test]
    fn test_only_known_placeholders_restored() {
        let out = make_deferred("{tool_descriptions} {current_date} {other}");
        assert_eq!(out, "{tool_descriptions} {current_date} {{other}}");
    }

    #[test]
    fn test_round_trip_with_nested_json() {
        let text = r#"Reply as {"result": {"items": [{}]}} on {current_date}. Tools: {tool_descriptions}"#;
        assert_eq!(
            render(&make_deferred(text)),
            r#"Reply as {"result": {"items": [{}]}} on 2024-01-31. Tools: TOOLS"#
        );
    }

    #[test]
    fn test_round_trip_unbalanced_braces() {
        let text = "}}} {{ {current_date {tool_descriptions}} x";
        assert_eq!(render(&make_deferred(text)), "}}} {{ {current_date TOOLS} x");
    }

    #[test]
    fn test_round_trip_text_without_placeholders() {
        let text = "plain {x} text";
        assert_eq!(render(&make_deferred(text)), text);
    }

    #[test]
    fn test_placeholder_inside_literal_braces() {
        let text = "{{current_date}}";
        assert_eq!(render(&make_deferred(text)), "{2024-01-31}");
    }
}
