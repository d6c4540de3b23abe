//! Python source literals for text produced at conversion time.

/// A Python `str` literal that evaluates to `text`.
///
/// Multi-line text without awkward characters becomes a triple-quoted literal
/// so prompts stay readable in the generated file.
pub fn python_string(text: &str) -> String {
    if text.contains('\n') && fits_triple_quotes(text) {
        return format!("\"\"\"{}\"\"\"", text);
    }
    quoted(text)
}

/// A raw literal when possible, for regular expressions.
pub fn python_pattern(pattern: &str) -> String {
    let raw_safe = !pattern.contains(['"', '\n', '\r']) && !pattern.ends_with('\\');
    if raw_safe {
        format!("r\"{}\"", pattern)
    } else {
        quoted(pattern)
    }
}

fn fits_triple_quotes(text: &str) -> bool {
    !text.contains("\"\"\"")
        && !text.contains('\\')
        && !text.ends_with('"')
        && !text.chars().any(|c| c != '\n' && c != '\t' && c.is_control())
}

fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) < 0x100 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_quoted() {
        assert_eq!(python_string("say \"hi\""), r#""say \"hi\"""#);
        assert_eq!(python_string("tab\there"), r#""tab\there""#);
        assert_eq!(python_string(""), "\"\"");
    }

    #[test]
    fn test_multi_line_triple_quoted() {
        assert_eq!(python_string("a\n{b}\n"), "\"\"\"a\n{b}\n\"\"\"");
    }

    #[test]
    fn test_multi_line_with_backslash_escaped() {
        assert_eq!(python_string("C:\\path\nnext"), r#""C:\\path\nnext""#);
        assert_eq!(python_string("ends with\n\""), r#""ends with\n\"""#);
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(python_string("bell\u{7}"), r#""bell\x07""#);
    }

    #[test]
    fn test_pattern_prefers_raw() {
        assert_eq!(python_pattern(r"\d+[ \t]*"), r#"r"\d+[ \t]*""#);
        assert_eq!(python_pattern("quote\"\\"), r#""quote\"\\""#);
    }
}
