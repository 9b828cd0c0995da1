//! Placeholder substitution for prompt templates.
//!
//! Syntax: `{name}` is replaced by the variable `name`; `{{` and `}}` produce
//! literal braces. Substituted values are copied verbatim and never scanned
//! for placeholders, so a value such as an email body containing `{subject}`
//! stays literal text and cannot change which placeholders get filled.

use crate::error::PromptError;

/// Substitute `vars` into `template`.
///
/// Fails with [`PromptError::MissingVariable`] when a placeholder has no
/// value, and with [`PromptError::MalformedTemplate`] on unbalanced braces.
/// A format spec or conversion after the name (`{name:>10}`, `{name!r}`) is
/// ignored.
pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    out.push('{');
                    continue;
                }

                let mut field = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(malformed(position, "nested '{' in placeholder")),
                        other => field.push(other),
                    }
                }
                if !closed {
                    return Err(malformed(position, "unclosed '{'"));
                }

                let name = field_name(&field);
                if name.is_empty() {
                    return Err(malformed(position, "empty placeholder"));
                }
                let value = vars
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| PromptError::MissingVariable {
                        name: name.to_string(),
                    })?;
                out.push_str(value);
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_none() {
                    return Err(malformed(position, "single '}' encountered"));
                }
                out.push('}');
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Name part of a placeholder, without format spec or conversion.
fn field_name(field: &str) -> &str {
    let end = field.find([':', '!']).unwrap_or(field.len());
    field[..end].trim()
}

fn malformed(position: usize, reason: &str) -> PromptError {
    PromptError::MalformedTemplate {
        position,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_variables() {
        let out = format_prompt("Hello {name}, you are {age}.", &[("name", "Alice"), ("age", "30")])
            .unwrap();
        assert_eq!(out, "Hello Alice, you are 30.");
    }

    #[test]
    fn repeated_placeholder() {
        let out = format_prompt("{x}-{x}", &[("x", "a")]).unwrap();
        assert_eq!(out, "a-a");
    }

    #[test]
    fn missing_variable_is_named() {
        let err = format_prompt("From {from_address}: {subject}", &[("from_address", "a@b.c")])
            .unwrap_err();
        match err {
            PromptError::MissingVariable { name } => assert_eq!(name, "subject"),
            other => panic!("expected MissingVariable, got {other:?}"),
        }
    }

    #[test]
    fn never_inserts_empty_for_missing() {
        assert!(format_prompt("{body}", &[]).is_err());
    }

    #[test]
    fn value_braces_stay_literal() {
        let out = format_prompt(
            "Subject: {subject}\nBody: {body}",
            &[("subject", "Crash"), ("body", "see {malicious} and {subject}")],
        )
        .unwrap();
        assert_eq!(out, "Subject: Crash\nBody: see {malicious} and {subject}");
    }

    #[test]
    fn value_with_unbalanced_braces() {
        let out = format_prompt("[{body}]", &[("body", "fn main() { x }}")]).unwrap();
        assert_eq!(out, "[fn main() { x }}]");
    }

    #[test]
    fn doubled_braces_in_template() {
        let out = format_prompt(r#"{{"title": "{title}"}}"#, &[("title", "Bug")]).unwrap();
        assert_eq!(out, r#"{"title": "Bug"}"#);
    }

    #[test]
    fn extra_variables_ignored() {
        let out = format_prompt("{a}", &[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(out, "1");
    }

    #[test]
    fn format_spec_ignored() {
        let out = format_prompt("{name:>10}", &[("name", "x")]).unwrap();
        assert_eq!(out, "x");
    }

    #[test]
    fn unclosed_brace_is_malformed() {
        let err = format_prompt("Hello {name", &[("name", "x")]).unwrap_err();
        assert!(matches!(err, PromptError::MalformedTemplate { position: 6, .. }));
    }

    #[test]
    fn stray_closing_brace_is_malformed() {
        let err = format_prompt("oops } here", &[]).unwrap_err();
        assert!(matches!(err, PromptError::MalformedTemplate { position: 5, .. }));
    }

    #[test]
    fn empty_placeholder_is_malformed() {
        assert!(matches!(
            format_prompt("{}", &[]),
            Err(PromptError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn multibyte_text_preserved() {
        let out = format_prompt("Grüße {who} ✓", &[("who", "Zoë")]).unwrap();
        assert_eq!(out, "Grüße Zoë ✓");
    }
}
