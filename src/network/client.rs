//! HTTP client wrapper - executes requests and formats responses

use std::time::{Duration, Instant};

use crate::messages::ExecutionResult;
use crate::models::{HttpMethod, ResolvedRequest};

/// Build a reqwest request from a resolved request
fn build_request(
    client: &reqwest::Client,
    request: &ResolvedRequest,
) -> Result<reqwest::RequestBuilder, String> {
    let method: HttpMethod = request.method.parse()?;

    let mut req_builder = match method {
        HttpMethod::GET => client.get(&request.url),
        HttpMethod::POST => client.post(&request.url),
        HttpMethod::PUT => client.put(&request.url),
        HttpMethod::PATCH => client.patch(&request.url),
        HttpMethod::DELETE => client.delete(&request.url),
        HttpMethod::HEAD => client.head(&request.url),
        HttpMethod::OPTIONS => client.request(reqwest::Method::OPTIONS, &request.url),
    };

    // Multi-valued headers are sent as repeated header lines
    for (key, values) in &request.headers {
        for value in values.values() {
            req_builder = req_builder.header(key.as_str(), value);
        }
    }

    if let Some(body) = request.body_text() {
        req_builder = req_builder.body(body);
    }

    Ok(req_builder)
}

/// Execute a request and return its single completion message
pub async fn execute_request(
    client: &reqwest::Client,
    request: ResolvedRequest,
    request_id: u64,
) -> ExecutionResult {
    let start = Instant::now();
    let req_builder = match build_request(client, &request) {
        Ok(builder) => builder,
        Err(message) => {
            return ExecutionResult::Failed {
                id: request_id,
                message: format!("Invalid request: {}", message),
                time_ms: 0,
            }
        }
    };

    let result = req_builder.send().await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(resp) => {
            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();
            match resp.text().await {
                Ok(body) => {
                    let formatted = if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
                        serde_json::to_string_pretty(&json).unwrap_or(body)
                    } else {
                        body
                    };
                    ExecutionResult::Completed {
                        id: request_id,
                        status,
                        headers,
                        body: formatted,
                        time_ms: start.elapsed().as_millis() as u64,
                    }
                }
                Err(e) => ExecutionResult::Failed {
                    id: request_id,
                    message: format!("Error reading body: {}", e),
                    time_ms: elapsed,
                },
            }
        }
        Err(e) => {
            let msg = if e.is_timeout() {
                "Request timed out".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else if e.is_builder() {
                format!("Invalid request: {}", e)
            } else {
                format!("Request failed: {}", e)
            };
            ExecutionResult::Failed {
                id: request_id,
                message: msg,
                time_ms: elapsed,
            }
        }
    }
}

/// Create an HTTP client with the given per-request timeout
pub fn create_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
