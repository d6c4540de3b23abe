//! Deferred placeholder substitution with Python `str.format` semantics.
//!
//! Only named fields are supported: `{name}` is replaced, `{{` and `}}` collapse to
//! literal braces, and anything else is an error, exactly as the generated programs
//! see it when they call `SYSTEM_PROMPT_TEMPLATE.format(...)`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown placeholder '{name}' at byte {offset}")]
    UnknownField { name: String, offset: usize },

    #[error("unsupported placeholder '{field}' at byte {offset}")]
    UnsupportedField { field: String, offset: usize },

    #[error("single '{{' at byte {0} is never closed")]
    Unclosed(usize),

    #[error("single '}}' at byte {0} has no matching '{{'")]
    UnmatchedClose(usize),
}

enum Piece<'a> {
    Literal(&'a str),
    Field { name: &'a str, offset: usize },
}

fn tokenize(template: &str) -> Result<Vec<Piece<'_>>, RenderError> {
    let bytes = template.as_bytes();
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                pieces.push(Piece::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                let close = template[i + 1..]
                    .find('}')
                    .map(|p| i + 1 + p)
                    .ok_or(RenderError::Unclosed(i))?;
                let field = &template[i + 1..close];
                if !is_identifier(field) {
                    return Err(RenderError::UnsupportedField {
                        field: field.to_string(),
                        offset: i,
                    });
                }
                pieces.push(Piece::Literal(&template[literal_start..i]));
                pieces.push(Piece::Field {
                    name: field,
                    offset: i,
                });
                i = close + 1;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                pieces.push(Piece::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'}' => return Err(RenderError::UnmatchedClose(i)),
            _ => i += 1,
        }
    }
    pieces.push(Piece::Literal(&template[literal_start..]));
    Ok(pieces)
}

fn is_identifier(field: &str) -> bool {
    let mut chars = field.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Substitute named fields. Values are inserted as-is and never re-scanned.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    for piece in tokenize(template)? {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Field { name, offset } => {
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| RenderError::UnknownField {
                        name: name.to_string(),
                        offset,
                    })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Every substitutable field in order of appearance, repeats included.
pub fn template_fields(template: &str) -> Result<Vec<String>, RenderError> {
    Ok(tokenize(template)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Field { name, .. } => Some(name.to_string()),
            Piece::Literal(_) => None,
        })
        .collect())
}
