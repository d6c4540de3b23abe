//! Evaluation of Python string literal expressions.

use tree_sitter::Node;

use crate::module::{SourceModule, callee_name, named_children};

/// Value of a literal string expression, or `None` when the expression is not
/// statically a string.
///
/// Handles plain and prefixed literals, implicit concatenation, parentheses,
/// `+` between literals, `.strip()` family calls and `dedent(...)`.
pub fn string_value(module: &SourceModule, node: Node<'_>) -> Option<String> {
    match node.kind() {
        // f-strings with `{expr}` parts are only known at run time
        "string" if has_interpolation(node) => None,
        "string" => Some(decode_literal(module.node_text(node))),
        "concatenated_string" => {
            let mut out = String::new();
            for part in named_children(node) {
                out.push_str(&string_value(module, part)?);
            }
            Some(out)
        }
        "parenthesized_expression" => {
            let inner = named_children(node);
            match inner.as_slice() {
                [only] => string_value(module, *only),
                _ => None,
            }
        }
        "binary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            if module.node_text(operator) != "+" {
                return None;
            }
            let left = string_value(module, node.child_by_field_name("left")?)?;
            let right = string_value(module, node.child_by_field_name("right")?)?;
            Some(left + &right)
        }
        "call" => call_value(module, node),
        _ => None,
    }
}

fn has_interpolation(node: Node<'_>) -> bool {
    named_children(node)
        .iter()
        .any(|child| child.kind() == "interpolation")
}

fn call_value(module: &SourceModule, node: Node<'_>) -> Option<String> {
    let function = node.child_by_field_name("function")?;
    let args = named_children(node.child_by_field_name("arguments")?);

    match (function.kind(), callee_name(module, function)?) {
        ("attribute", method @ ("strip" | "lstrip" | "rstrip")) if args.is_empty() => {
            let receiver = string_value(module, function.child_by_field_name("object")?)?;
            Some(match method {
                "strip" => receiver.trim().to_string(),
                "lstrip" => receiver.trim_start().to_string(),
                _ => receiver.trim_end().to_string(),
            })
        }
        (_, "dedent") => match args.as_slice() {
            [only] => string_value(module, *only).map(|text| dedent(&text)),
            _ => None,
        },
        _ => None,
    }
}

/// Decode the source text of a single string literal.
pub fn decode_literal(literal: &str) -> String {
    let prefix_len = literal
        .find(['"', '\''])
        .unwrap_or(0);
    let prefix = literal[..prefix_len].to_ascii_lowercase();
    let rest = &literal[prefix_len..];

    let quote_len = if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
        3
    } else {
        1
    };
    if rest.len() < quote_len * 2 {
        return String::new();
    }
    let body = &rest[quote_len..rest.len() - quote_len];

    let mut value = if prefix.contains('r') {
        body.to_string()
    } else {
        unescape(body)
    };
    if prefix.contains('f') {
        value = value.replace("{{", "{").replace("}}", "}");
    }
    value
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                push_code(&mut out, u32::from_str_radix(&digits, 8).ok(), &format!("\\{}", digits));
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next_if(|d| d.is_ascii_hexdigit())).collect();
                let code = if digits.len() == width {
                    u32::from_str_radix(&digits, 16).ok()
                } else {
                    None
                };
                push_code(&mut out, code, &format!("\\{}{}", next, digits));
            }
            other => {
                // Unknown escapes, `\N{...}` included, stay verbatim.
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn push_code(out: &mut String, code: Option<u32>, verbatim: &str) {
    match code.and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => out.push_str(verbatim),
    }
}

/// Python's `textwrap.dedent`: strip the longest common leading whitespace.
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(|common, indent| {
            let shared = common
                .char_indices()
                .zip(indent.chars())
                .take_while(|((_, a), b)| a == b)
                .last()
                .map(|((i, a), _)| i + a.len_utf8())
                .unwrap_or(0);
            &common[..shared]
        })
        .unwrap_or("");

    let mut out: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push("");
        } else {
            out.push(line.strip_prefix(margin).unwrap_or(line));
        }
    }
    out.join("\n")
}

/// Docstring cleanup in the manner of `inspect.cleandoc`.
pub fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.split('\n');
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let rest = dedent(&rest.join("\n"));

    let mut joined = String::from(first);
    if !rest.trim().is_empty() {
        if !joined.is_empty() {
            joined.push('\n');
        }
        joined.push_str(&rest);
    }
    joined.trim().to_string()
}
