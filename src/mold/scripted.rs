//! Scripted (Starlark) request payload
//!
//! Metadata lives in tagged comment lines inside the script:
//! `meta:name:`, `meta:prev_req:`, `doc:url:` and `doc:method:`.
//! Each tag has its own extraction function so the tag scheme can be
//! replaced without touching callers.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::models::{Headers, ResolvedRequest};

/// Verbatim script source. Every field is derived from it on demand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptedRequest {
    pub script: String,
}

impl ScriptedRequest {
    pub fn new(script: impl Into<String>) -> Self {
        ScriptedRequest { script: script.into() }
    }

    pub fn name(&self) -> String {
        extract_name(&self.script)
    }

    pub fn prev_req(&self) -> String {
        extract_prev_req(&self.script)
    }

    pub fn url(&self) -> String {
        extract_url(&self.script)
    }

    pub fn method(&self) -> String {
        extract_method(&self.script)
    }

    /// Script with every `meta:name:` line pointing at `new_name`.
    /// Returns `None` when the script carries no such line.
    pub fn renamed_script(&self, new_name: &str) -> Option<String> {
        let pattern = name_rewrite_pattern();
        if !pattern.is_match(&self.script) {
            return None;
        }
        let rewritten = pattern.replace_all(&self.script, |caps: &Captures| {
            format!("{} {}", &caps[1], new_name)
        });
        Some(rewritten.into_owned())
    }
}

/// Turns a script into a request. Full Starlark evaluation is an external
/// concern; this seam lets a real interpreter be plugged in.
pub trait ScriptEvaluator {
    fn evaluate(&self, script: &str) -> ResolvedRequest;
}

/// Reads top-level `url = ...`, `method = ...`, `headers = ...` and
/// `body = ...` assignments whose value is a JSON-compatible literal.
/// `url` and `method` fall back to the `doc:` tags when no literal is found.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralAssignments;

impl ScriptEvaluator for LiteralAssignments {
    fn evaluate(&self, script: &str) -> ResolvedRequest {
        let url = literal_assignment(script, "url")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| extract_url(script));
        let method = literal_assignment(script, "method")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| extract_method(script));
        let headers = literal_assignment(script, "headers")
            .and_then(|v| serde_json::from_value::<Headers>(v).ok())
            .unwrap_or_default();
        let body = literal_assignment(script, "body");

        ResolvedRequest {
            url,
            method,
            headers,
            body,
        }
    }
}

pub fn extract_name(script: &str) -> String {
    extract_tag(tag_pattern("meta:name:"), script)
}

pub fn extract_prev_req(script: &str) -> String {
    extract_tag(tag_pattern("meta:prev_req:"), script)
}

pub fn extract_url(script: &str) -> String {
    extract_tag(tag_pattern("doc:url:"), script)
}

pub fn extract_method(script: &str) -> String {
    extract_tag(tag_pattern("doc:method:"), script)
}

/// First matching line wins; a miss is an empty string
fn extract_tag(pattern: &Regex, script: &str) -> String {
    pattern
        .captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn tag_pattern(tag: &'static str) -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    static PREV_REQ: OnceLock<Regex> = OnceLock::new();
    static URL: OnceLock<Regex> = OnceLock::new();
    static METHOD: OnceLock<Regex> = OnceLock::new();

    let cell = match tag {
        "meta:name:" => &NAME,
        "meta:prev_req:" => &PREV_REQ,
        "doc:url:" => &URL,
        _ => &METHOD,
    };
    cell.get_or_init(|| {
        Regex::new(&format!(r"(?m)^.*?{}(.*?)$", regex::escape(tag))).expect("valid tag pattern")
    })
}

fn name_rewrite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^(.*?meta:name:)[^\r\n]*").expect("valid rewrite pattern"))
}

/// Parse the literal on the right-hand side of a top-level `key = ...`
fn literal_assignment(script: &str, key: &str) -> Option<serde_json::Value> {
    let pattern = Regex::new(&format!(r"(?m)^{}\s*=\s*", regex::escape(key))).ok()?;
    let found = pattern.find(script)?;
    let rest = &script[found.end()..];
    serde_json::Deserializer::from_str(rest)
        .into_iter::<serde_json::Value>()
        .next()?
        .ok()
}
