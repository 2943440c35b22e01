//! Rendering helpers - preview highlighting and list colours

use ratatui::prelude::*;

use crate::models::HttpMethod;
use crate::mold::ContentType;

/// Format raw request source for the preview pane
pub fn highlight_source(raw: &str, content_type: ContentType) -> Vec<Line<'static>> {
    match content_type {
        ContentType::Yaml => highlight_yaml(raw),
        ContentType::Star => highlight_star(raw),
    }
}

/// Simple YAML highlighting: comments, keys, quoted and literal scalars
pub fn highlight_yaml(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                return Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let indent = &line[..line.len() - trimmed.len()];
            let (marker, rest) = match trimmed.strip_prefix("- ") {
                Some(rest) => ("- ", rest),
                None => ("", trimmed),
            };

            let mut spans = vec![Span::raw(indent.to_string())];
            if !marker.is_empty() {
                spans.push(Span::styled(marker.to_string(), Style::default().fg(Color::Yellow)));
            }

            match split_yaml_key(rest) {
                Some((key, value)) => {
                    spans.push(Span::styled(
                        key.to_string(),
                        Style::default().fg(Color::Cyan),
                    ));
                    spans.push(Span::styled(":", Style::default().fg(Color::White)));
                    spans.push(scalar_span(value));
                }
                None => spans.push(scalar_span(rest)),
            }
            Line::from(spans)
        })
        .collect()
}

/// `key: value` split that ignores colons inside quotes or URLs
fn split_yaml_key(text: &str) -> Option<(&str, &str)> {
    if text.starts_with('"') || text.starts_with('\'') {
        return None;
    }
    let idx = text.find(':')?;
    let after = &text[idx + 1..];
    if after.is_empty() || after.starts_with(' ') {
        Some((&text[..idx], after))
    } else {
        None
    }
}

fn scalar_span(value: &str) -> Span<'static> {
    let v = value.trim();
    let color = if v.starts_with('"') || v.starts_with('\'') {
        Color::Green
    } else if matches!(v, "true" | "false" | "null" | "~") {
        Color::Magenta
    } else if !v.is_empty() && v.parse::<f64>().is_ok() {
        Color::Yellow
    } else if HttpMethod::is_valid(v) {
        method_color(&v.to_uppercase())
    } else {
        Color::White
    };
    Span::styled(value.to_string(), Style::default().fg(color))
}

const STAR_KEYWORDS: [&str; 12] = [
    "def", "return", "load", "if", "elif", "else", "for", "in", "not", "and", "or", "pass",
];

/// Simple Starlark highlighting: tagged metadata comments stand out
pub fn highlight_star(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| {
            let Some(hash) = comment_start(line) else {
                return Line::from(highlight_code(line));
            };

            let (code, comment) = line.split_at(hash);
            let mut spans = highlight_code(code);
            let tagged = comment.contains("meta:") || comment.contains("doc:");
            let style = if tagged {
                Style::default().fg(Color::Magenta).bold()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(comment.to_string(), style));
            Line::from(spans)
        })
        .collect()
}

/// Byte offset of a `#` outside string literals
fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return Some(i),
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    None
}

fn highlight_code(code: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, spans: &mut Vec<Span<'static>>| {
        if current.is_empty() {
            return;
        }
        let style = if STAR_KEYWORDS.contains(&current.as_str()) {
            Style::default().fg(Color::Yellow).bold()
        } else if matches!(current.as_str(), "True" | "False" | "None") {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default()
        };
        spans.push(Span::styled(std::mem::take(current), style));
    };

    for c in code.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    spans.push(Span::styled(
                        std::mem::take(&mut current),
                        Style::default().fg(Color::Green),
                    ));
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                flush(&mut current, &mut spans);
                quote = Some(c);
                current.push(c);
            }
            None if c.is_alphanumeric() || c == '_' => current.push(c),
            None => {
                flush(&mut current, &mut spans);
                spans.push(Span::raw(c.to_string()));
            }
        }
    }

    if quote.is_some() {
        spans.push(Span::styled(current, Style::default().fg(Color::Green)));
    } else {
        flush(&mut current, &mut spans);
    }
    spans
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        "HEAD" | "OPTIONS" => Color::Gray,
        _ => Color::White,
    }
}
