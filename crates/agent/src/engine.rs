use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use sundial_core::config::AgentConfig;
use sundial_core::{
    MessageRole, Run, RunId, RunStatus, ThreadId, ToolCallRequest, ToolCallResult,
};
use sundial_openai::{ApiError, AssistantsApi};

use crate::registry::ToolRegistry;

/// Polling knobs for one engine instance. The interval is a courtesy floor
/// toward the remote service; the attempt cap turns a run that never reaches
/// a terminal status into a typed failure instead of an unbounded loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5), max_attempts: 60 }
    }
}

impl PollPolicy {
    /// Config values arrive pre-validated (interval >= 1s, attempts >= 1).
    pub fn from_config(agent: &AgentConfig) -> Self {
        Self {
            interval: Duration::from_secs(agent.poll_interval_secs),
            max_attempts: agent.max_poll_attempts,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("run {run_id} ended in terminal status `{status}`")]
    Terminal { run_id: String, status: RunStatus },
    #[error("run {run_id} did not reach a terminal status within {attempts} polls")]
    Timeout { run_id: String, attempts: u32 },
    #[error("run {run_id} completed but the thread holds no assistant reply")]
    EmptyReply { run_id: String },
    #[error("remote service failed while resolving run {run_id}: {source}")]
    Api { run_id: String, source: ApiError },
}

/// The run-resolution state machine. Polls a launched run until it reaches a
/// terminal status, resolving every `requires_action` stall by dispatching
/// the pending tool-call batch through the registry and submitting one
/// output per pending call id.
pub struct RunResolutionEngine {
    api: Arc<dyn AssistantsApi>,
    registry: Arc<ToolRegistry>,
    policy: PollPolicy,
}

impl RunResolutionEngine {
    pub fn new(api: Arc<dyn AssistantsApi>, registry: Arc<ToolRegistry>, policy: PollPolicy) -> Self {
        Self { api, registry, policy }
    }

    /// Drive `run` to completion and return the assistant's final reply.
    pub async fn resolve(&self, run: &Run) -> Result<String, RunFailure> {
        let run_id = &run.id;
        let thread_id = &run.thread_id;

        for attempt in 1..=self.policy.max_attempts {
            if !self.policy.interval.is_zero() {
                tokio::time::sleep(self.policy.interval).await;
            }

            let current = self
                .api
                .get_run(thread_id, run_id)
                .await
                .map_err(|source| RunFailure::Api { run_id: run_id.0.clone(), source })?;

            match current.status {
                RunStatus::Completed => {
                    debug!(run_id = %run_id, attempt, "run completed; fetching reply");
                    return self.latest_assistant_reply(thread_id, run_id).await;
                }
                RunStatus::RequiresAction => {
                    let outputs = self.resolve_tool_batch(&current.pending_tool_calls).await;
                    self.api
                        .submit_tool_outputs(thread_id, run_id, &outputs)
                        .await
                        .map_err(|source| RunFailure::Api { run_id: run_id.0.clone(), source })?;
                    info!(
                        run_id = %run_id,
                        attempt,
                        submitted = outputs.len(),
                        "tool outputs submitted; resuming poll"
                    );
                }
                status if status.is_terminal_failure() => {
                    warn!(run_id = %run_id, attempt, status = %status, "run ended without success");
                    return Err(RunFailure::Terminal { run_id: run_id.0.clone(), status });
                }
                status => {
                    debug!(run_id = %run_id, attempt, status = %status, "run still working; waiting");
                }
            }
        }

        Err(RunFailure::Timeout { run_id: run_id.0.clone(), attempts: self.policy.max_attempts })
    }

    /// One output per pending call id, unconditionally. Unknown tools,
    /// undecodable arguments, and failed invocations all yield an error-text
    /// output for their call id so the submission never omits one.
    async fn resolve_tool_batch(&self, calls: &[ToolCallRequest]) -> Vec<ToolCallResult> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            let output = self.resolve_tool_call(call).await;
            outputs.push(ToolCallResult { call_id: call.call_id.clone(), output });
        }
        outputs
    }

    async fn resolve_tool_call(&self, call: &ToolCallRequest) -> String {
        let args = match call.arguments.decode() {
            Ok(args) => args,
            Err(error) => {
                warn!(tool = %call.name, call_id = %call.call_id, error = %error, "undecodable tool arguments");
                return format!("error: arguments for tool `{}` could not be decoded: {error}", call.name);
            }
        };

        let Some(tool) = self.registry.resolve(&call.name) else {
            warn!(tool = %call.name, call_id = %call.call_id, "unknown tool requested; submitting error result");
            return format!("error: tool `{}` is not available", call.name);
        };

        match tool.invoke(args).await {
            Ok(serde_json::Value::String(text)) => text,
            Ok(value) => value.to_string(),
            Err(error) => {
                warn!(tool = %call.name, call_id = %call.call_id, error = %error, "tool invocation failed");
                format!("error: tool `{}` failed: {error}", call.name)
            }
        }
    }

    async fn latest_assistant_reply(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<String, RunFailure> {
        let messages = self
            .api
            .list_messages(thread_id)
            .await
            .map_err(|source| RunFailure::Api { run_id: run_id.0.clone(), source })?;

        // Listings arrive newest first, so the first assistant-authored entry
        // is the reply for this run.
        messages
            .into_iter()
            .find(|message| message.role == MessageRole::Assistant)
            .map(|message| message.text)
            .ok_or_else(|| RunFailure::EmptyReply { run_id: run_id.0.clone() })
    }
}
