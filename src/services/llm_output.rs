//! Typed parsing of free-text model output.
//!
//! Model responses are parsed in two stages:
//! 1. strict JSON on the trimmed text;
//! 2. JSON after stripping a markdown code fence, with Python-style
//!    literals normalised and a fallback to the outermost `{...}`/`[...]`
//!    span when the model wrapped the payload in prose.
//!
//! Nothing is ever evaluated. When both stages fail the caller gets
//! [`ParsedOutput::Empty`] and takes its fallback path.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Result of parsing a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput<T> {
    Parsed(T),
    /// Nothing usable; `raw` is kept for logging.
    Empty { raw: String },
}

impl<T> ParsedOutput<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Empty { .. } => None,
        }
    }
}

/// Parse `raw` as `T`. `section` names the call site in logs.
pub fn parse_llm_output<T: DeserializeOwned>(section: &str, raw: &str) -> ParsedOutput<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return ParsedOutput::Parsed(value);
    }

    let body = strip_code_fence(trimmed);
    let normalized = normalize_literals(body);
    let mut attempts = vec![body.to_string(), normalized.clone()];
    if let Some(span) = outermost_span(&normalized) {
        attempts.push(span.to_string());
    }

    for attempt in &attempts {
        if let Ok(value) = serde_json::from_str::<T>(attempt) {
            debug!(section, "Parsed model output after cleanup");
            return ParsedOutput::Parsed(value);
        }
    }

    warn!(
        section,
        preview = %preview(trimmed, 200),
        "Could not parse model output, treating as empty"
    );
    ParsedOutput::Empty {
        raw: raw.to_string(),
    }
}

/// Body of the first fenced block, or the input when there is none.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    // Optional language tag on the opening line.
    let body_start = match after.find('\n') {
        Some(newline) if after[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => newline + 1,
        _ => 0,
    };
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Rewrite Python literal idioms (`None`, `True`, `False`, single-quoted
/// strings) into JSON. Double-quoted strings are left untouched.
pub fn normalize_literals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    out.push(inner);
                    if inner == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if inner == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                if escaped == '\'' {
                                    out.push('\'');
                                } else {
                                    out.push('\\');
                                    out.push(escaped);
                                }
                            }
                        }
                        '"' => out.push_str("\\\""),
                        '\'' => break,
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "None" => "null",
                    "True" => "true",
                    "False" => "false",
                    _ => word.as_str(),
                });
            }
            other => out.push(other),
        }
    }
    out
}

/// From the first `{` or `[` to the last matching closer.
fn outermost_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_plain_json() {
        let parsed: ParsedOutput<Value> = parse_llm_output("t", r#"{"a": 1}"#);
        assert_eq!(parsed, ParsedOutput::Parsed(json!({"a": 1})));
    }

    #[test]
    fn test_fenced_json_with_language_tag() {
        let raw = "Here you go:\n```json\n[\"one\", \"two\"]\n```\nthanks";
        let parsed: ParsedOutput<Vec<String>> = parse_llm_output("t", raw);
        assert_eq!(parsed.into_option().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_fence_without_tag() {
        assert_eq!(strip_code_fence("```\n{\"x\": 1}\n```"), "{\"x\": 1}");
        assert_eq!(strip_code_fence("no fence"), "no fence");
    }

    #[test]
    fn test_python_literals() {
        let raw = "{'status': 'REJECTED', 'problem_type': None, 'ok': True, 'note': 'say \"hi\"'}";
        let parsed: ParsedOutput<Value> = parse_llm_output("t", raw);
        assert_eq!(
            parsed.into_option().unwrap(),
            json!({"status": "REJECTED", "problem_type": null, "ok": true, "note": "say \"hi\""})
        );
    }

    #[test]
    fn test_literal_words_inside_strings_untouched() {
        let normalized = normalize_literals(r#"{"text": "None of True"}"#);
        assert_eq!(normalized, r#"{"text": "None of True"}"#);
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "The answer is {\"a\": [1, 2]} as requested.";
        let parsed: ParsedOutput<Value> = parse_llm_output("t", raw);
        assert_eq!(parsed.into_option().unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_garbage_is_empty() {
        let parsed: ParsedOutput<Value> = parse_llm_output("t", "I cannot help with that");
        let ParsedOutput::Empty { raw } = parsed else {
            panic!("expected empty output");
        };
        assert_eq!(raw, "I cannot help with that");
    }

    #[test]
    fn test_wrong_shape_is_empty() {
        let parsed: ParsedOutput<Vec<String>> = parse_llm_output("t", r#"{"a": 1}"#);
        assert!(matches!(parsed, ParsedOutput::Empty { .. }));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("ñañaña", 2), "ña...");
        assert_eq!(preview("short", 10), "short");
    }
}
