//! Raw View - pretty-printed JSON with light syntax colouring

use ratatui::text::{Line, Span};

use crate::tui::theme::PipelineTheme;
use crate::value::SemanticValue;

/// Pretty JSON, one styled line per output line
pub fn raw_lines(value: &SemanticValue, theme: &PipelineTheme) -> Vec<Line<'static>> {
    value
        .to_pretty_json()
        .lines()
        .map(|line| style_line(line, theme))
        .collect()
}

fn style_line(line: &str, theme: &PipelineTheme) -> Line<'static> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let mut spans = vec![Span::raw(indent.to_string())];

    let rest = match key_split(trimmed) {
        Some((key, rest)) => {
            spans.push(Span::styled(key.to_string(), theme.key_label()));
            spans.push(Span::styled(": ", theme.punctuation()));
            rest
        }
        None => trimmed,
    };

    let (body, comma) = match rest.strip_suffix(',') {
        Some(body) => (body, ","),
        None => (rest, ""),
    };
    spans.push(Span::styled(body.to_string(), value_style(body, theme)));
    if !comma.is_empty() {
        spans.push(Span::styled(comma, theme.punctuation()));
    }
    Line::from(spans)
}

/// Split `"key": rest` into its parts. Keys may contain escaped quotes.
fn key_split(s: &str) -> Option<(&str, &str)> {
    if !s.starts_with('"') {
        return None;
    }
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                let key = &s[..=i];
                return s[i + 1..].strip_prefix(": ").map(|rest| (key, rest));
            }
            _ => escaped = false,
        }
    }
    None
}

fn value_style(token: &str, theme: &PipelineTheme) -> ratatui::style::Style {
    match token {
        "null" => theme.null_marker(),
        "true" | "false" => theme.literal(),
        "{" | "}" | "[" | "]" | "{}" | "[]" => theme.punctuation(),
        t if t.starts_with('"') => theme.string_literal(),
        t if t.starts_with(|c: char| c == '-' || c.is_ascii_digit()) => theme.literal(),
        _ => theme.text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::widgets::utils::lines_to_text;
    use serde_json::json;

    #[test]
    fn test_raw_text_matches_pretty_json() {
        let theme = PipelineTheme::new();
        let value = SemanticValue::from_json(json!({"T": {"functor": "p", "args": [1, null]}}));
        let lines = raw_lines(&value, &theme);
        assert_eq!(lines_to_text(&lines), value.to_pretty_json());
    }

    #[test]
    fn test_keys_are_highlighted() {
        let theme = PipelineTheme::new();
        let line = style_line(r#"  "functor": "p","#, &theme);
        assert_eq!(line.spans[1].content, "\"functor\"");
        assert_eq!(line.spans[1].style, theme.key_label());
        assert_eq!(line.spans[3].style, theme.string_literal());
    }

    #[test]
    fn test_key_with_escaped_quote() {
        assert_eq!(
            key_split(r#""a\"b": 1"#),
            Some((r#""a\"b""#, "1"))
        );
        assert_eq!(key_split(r#""plain string""#), None);
    }

    #[test]
    fn test_scalar_document() {
        let theme = PipelineTheme::new();
        let lines = raw_lines(&SemanticValue::string("Ai"), &theme);
        assert_eq!(lines_to_text(&lines), "\"Ai\"");
    }
}
