//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Application name, used for the config directory and the status bar
pub const APP_NAME: &str = "goful";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extensions recognised as declarative (YAML) requests
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Extension recognised as scripted (Starlark) requests
pub const STAR_EXTENSION: &str = "star";

/// Default per-request timeout for the execution adapter
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Suffix appended to a name when proposing a copy
pub const COPY_SUFFIX: &str = "-copy";

/// Template for a new declarative request. `{name}` is substituted.
pub const YAML_TEMPLATE: &str = r#"name: {name}
prev_req: ""
url: http://localhost:8080/
method: GET
headers:
  Accept: application/json
body: ""
"#;

/// Template for a new scripted request. `{name}` is substituted.
pub const STAR_TEMPLATE: &str = r#""""
meta:name: {name}
meta:prev_req:
doc:url: http://localhost:8080/
doc:method: GET
"""
# Request url
url = "http://localhost:8080/"
# HTTP method
method = "GET"
# HTTP headers, e.g. { "X-Foo": "bar", "X-Foos": [ "Bar1", "Bar2" ] }
headers = {}
# Request body, e.g. { "id": 1, "people": [ {"name": "Joe"}, {"name": "Jane"} ] }
body = {}
"#;
