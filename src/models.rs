use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    /// Whether a free-text method from a request file names a known method
    pub fn is_valid(method: &str) -> bool {
        method.parse::<HttpMethod>().is_ok()
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "PATCH" => Ok(HttpMethod::PATCH),
            "DELETE" => Ok(HttpMethod::DELETE),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            other => Err(format!("unknown HTTP method '{}'", other)),
        }
    }
}

/// Whether a URL from a request file is absolute http(s) with a host
pub fn is_valid_url(url: &str) -> bool {
    match reqwest::Url::parse(url.trim()) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// A header value as written in request files: one string or a list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValues {
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValues::Single(v) => vec![v.as_str()],
            HeaderValues::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Header name to value(s), ordered by name
pub type Headers = BTreeMap<String, HeaderValues>;

/// A request ready to be handed to the execution adapter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedRequest {
    pub url: String,
    pub method: String,
    pub headers: Headers,
    pub body: Option<serde_json::Value>,
}

impl ResolvedRequest {
    /// Body bytes as sent on the wire. Strings go out verbatim, anything else as JSON.
    pub fn body_text(&self) -> Option<String> {
        match &self.body {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Object(map)) if map.is_empty() => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Outcome of one executed request, as shown to the user
#[derive(Clone, Debug)]
pub struct ExecutionReport {
    pub status_code: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub time_ms: u64,
}

impl ExecutionReport {
    /// Text printed after the session ends
    pub fn to_text(&self) -> String {
        let mut out = match self.status_code {
            Some(code) => format!("HTTP {} ({} ms)\n", code, self.time_ms),
            None => format!("Request failed ({} ms)\n", self.time_ms),
        };
        for (key, value) in &self.headers {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        out.push('\n');
        out.push_str(&self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::GET);
        assert_eq!(" Patch ".parse::<HttpMethod>().unwrap(), HttpMethod::PATCH);
        assert!(!HttpMethod::is_valid("<http method>"));
        assert!(!HttpMethod::is_valid(""));
    }

    #[test]
    fn test_url_validity() {
        assert!(is_valid_url("http://x/users/1"));
        assert!(is_valid_url(" https://api.example.com:8443/v1?q=1 "));
        assert!(!is_valid_url("<your url>"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("/users/1"));
        assert!(!is_valid_url("ftp://x/file"));
        assert!(!is_valid_url("http://"));
    }

    #[test]
    fn test_body_text() {
        let mut req = ResolvedRequest::default();
        assert_eq!(req.body_text(), None);

        req.body = Some(serde_json::json!("raw text"));
        assert_eq!(req.body_text().as_deref(), Some("raw text"));

        req.body = Some(serde_json::json!({"id": 1}));
        assert_eq!(req.body_text().as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn test_report_text_for_failure() {
        let report = ExecutionReport {
            status_code: None,
            headers: Vec::new(),
            body: "Connection failed: refused".to_string(),
            time_ms: 12,
        };
        let text = report.to_text();
        assert!(text.starts_with("Request failed (12 ms)"));
        assert!(text.contains("Connection failed: refused"));
    }
}
