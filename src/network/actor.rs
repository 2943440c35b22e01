//! Execution actor - runs HTTP requests in the Tokio runtime

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::{ExecutionCommand, ExecutionResult};
use crate::network::client::{create_client, execute_request};

/// Execution actor that turns commands into completion messages
pub struct ExecutionActor {
    client: reqwest::Client,
    result_tx: mpsc::UnboundedSender<ExecutionResult>,
    active_requests: JoinSet<()>,
}

impl ExecutionActor {
    pub fn new(result_tx: mpsc::UnboundedSender<ExecutionResult>, timeout_secs: u64) -> Self {
        ExecutionActor {
            client: create_client(timeout_secs),
            result_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<ExecutionCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ExecutionCommand::Execute { id, request }) => {
                            let result_tx = self.result_tx.clone();
                            let client = self.client.clone();

                            self.active_requests.spawn(async move {
                                tracing::info!(id, url = %request.url, method = %request.method, "Executing request");
                                let result = execute_request(&client, request, id).await;
                                tracing::info!(id, ok = matches!(result, ExecutionResult::Completed { .. }), "Request completed");
                                let _ = result_tx.send(result);
                            });
                        }

                        Some(ExecutionCommand::Shutdown) | None => {
                            self.active_requests.abort_all();
                            break;
                        }
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }
}
