//! Declarative (YAML) request payload

use regex::{NoExpand, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

use crate::models::{Headers, ResolvedRequest};

/// A request defined through typed YAML fields, plus its verbatim source
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeRequest {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub prev_req: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub url: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Headers,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    #[serde(skip)]
    pub raw: String,
}

impl DeclarativeRequest {
    /// Parse a YAML document, keeping the source text alongside the fields
    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as null; treat it as an empty request
        let mut request: DeclarativeRequest = if raw.trim().is_empty() {
            DeclarativeRequest::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        request.raw = raw.to_string();
        Ok(request)
    }

    /// Source text with every top-level `name` key pointing at `new_name`.
    ///
    /// Plain, quoted and spaced key forms are rewritten. A document without
    /// one gets the line inserted after any leading directives and `---`.
    pub fn renamed_raw(&self, new_name: &str) -> String {
        let line = format!("name: {}", yaml_scalar(new_name));
        let pattern = name_line_pattern();
        if pattern.is_match(&self.raw) {
            return pattern.replace_all(&self.raw, NoExpand(&line)).into_owned();
        }

        let at = body_start(&self.raw);
        let (head, tail) = self.raw.split_at(at);
        let sep = if head.is_empty() || head.ends_with('\n') { "" } else { "\n" };
        format!("{}{}{}\n{}", head, sep, line, tail)
    }

    pub fn resolve(&self) -> ResolvedRequest {
        ResolvedRequest {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

fn name_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?mR)^(?:name|"name"|'name')[ \t]*:(?:[ \t][^\r\n]*)?$"#)
            .expect("valid name pattern")
    })
}

/// Byte offset where mapping content begins: past leading blank lines,
/// comments, `%` directives and the first `---` marker.
fn body_start(raw: &str) -> usize {
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed == "---" {
            return offset + line.len();
        }
        if !(trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%')) {
            break;
        }
        offset += line.len();
    }
    0
}

/// Render a string as a YAML scalar, quoting only when YAML would misread it
pub(crate) fn yaml_scalar(value: &str) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Accept any YAML scalar (and null) for fields the files treat as text
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => s,
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        Some(serde_yaml::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
