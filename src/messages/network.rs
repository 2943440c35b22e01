//! Execution messages - communication between the session and the execution adapter

use crate::models::{ExecutionReport, ResolvedRequest};

/// Commands sent from the session to the execution adapter
#[derive(Debug, Clone)]
pub enum ExecutionCommand {
    /// Execute one request; exactly one [`ExecutionResult`] follows
    Execute { id: u64, request: ResolvedRequest },
    /// Shutdown the execution actor
    Shutdown,
}

/// Completion signal sent back to the session
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// The server answered (any status code)
    Completed {
        id: u64,
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
        time_ms: u64,
    },
    /// Transport-level failure
    Failed {
        id: u64,
        message: String,
        time_ms: u64,
    },
}

impl ExecutionResult {
    pub fn id(&self) -> u64 {
        match self {
            ExecutionResult::Completed { id, .. } => *id,
            ExecutionResult::Failed { id, .. } => *id,
        }
    }

    /// Collapse into the report printed for the user
    pub fn into_report(self) -> ExecutionReport {
        match self {
            ExecutionResult::Completed {
                status,
                headers,
                body,
                time_ms,
                ..
            } => ExecutionReport {
                status_code: Some(status),
                headers,
                body,
                time_ms,
            },
            ExecutionResult::Failed { message, time_ms, .. } => ExecutionReport {
                status_code: None,
                headers: Vec::new(),
                body: message,
                time_ms,
            },
        }
    }
}
