//! Scripted collaborator doubles shared by this crate's tests.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use sundial_core::{
    AssistantId, AssistantSpec, MessageRole, Run, RunId, ThreadId, ThreadMessage, ToolCallResult,
};
use sundial_openai::{ApiError, AssistantsApi};

fn exhausted<T>() -> Result<T, ApiError> {
    Err(ApiError::Transport("test script exhausted".to_string()))
}

#[derive(Default)]
pub struct ScriptedState {
    pub create_thread_results: VecDeque<Result<ThreadId, ApiError>>,
    pub get_thread_results: VecDeque<Result<ThreadId, ApiError>>,
    pub create_assistant_results: VecDeque<Result<AssistantId, ApiError>>,
    pub create_run_results: VecDeque<Result<Run, ApiError>>,
    pub get_run_results: VecDeque<Result<Run, ApiError>>,
    pub list_messages_results: VecDeque<Result<Vec<ThreadMessage>, ApiError>>,
    pub chat_replies: VecDeque<Result<String, ApiError>>,

    pub appended_messages: Vec<(ThreadId, MessageRole, String)>,
    pub submitted_outputs: Vec<(RunId, Vec<ToolCallResult>)>,
    pub created_specs: Vec<AssistantSpec>,
    pub create_thread_calls: usize,
    pub get_run_calls: usize,
}

/// Remote-service double driven by per-method scripts, in the same style as
/// the repository's other scripted test collaborators: queues feed responses,
/// recordings capture what the code under test sent.
#[derive(Default)]
pub struct ScriptedAssistantsApi {
    pub state: Mutex<ScriptedState>,
}

impl ScriptedAssistantsApi {
    pub fn new(state: ScriptedState) -> Self {
        Self { state: Mutex::new(state) }
    }

    pub async fn submitted_outputs(&self) -> Vec<(RunId, Vec<ToolCallResult>)> {
        self.state.lock().await.submitted_outputs.clone()
    }

    pub async fn appended_messages(&self) -> Vec<(ThreadId, MessageRole, String)> {
        self.state.lock().await.appended_messages.clone()
    }

    pub async fn created_specs(&self) -> Vec<AssistantSpec> {
        self.state.lock().await.created_specs.clone()
    }

    pub async fn create_thread_calls(&self) -> usize {
        self.state.lock().await.create_thread_calls
    }

    pub async fn get_run_calls(&self) -> usize {
        self.state.lock().await.get_run_calls
    }
}

#[async_trait::async_trait]
impl AssistantsApi for ScriptedAssistantsApi {
    async fn create_thread(&self) -> Result<ThreadId, ApiError> {
        let mut state = self.state.lock().await;
        state.create_thread_calls += 1;
        state.create_thread_results.pop_front().unwrap_or_else(exhausted)
    }

    async fn get_thread(&self, _thread_id: &ThreadId) -> Result<ThreadId, ApiError> {
        let mut state = self.state.lock().await;
        state.get_thread_results.pop_front().unwrap_or_else(exhausted)
    }

    async fn append_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.appended_messages.push((thread_id.clone(), role, text.to_string()));
        Ok(())
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId, ApiError> {
        let mut state = self.state.lock().await;
        state.created_specs.push(spec.clone());
        state.create_assistant_results.pop_front().unwrap_or_else(exhausted)
    }

    async fn create_run(
        &self,
        _thread_id: &ThreadId,
        _assistant_id: &AssistantId,
    ) -> Result<Run, ApiError> {
        let mut state = self.state.lock().await;
        state.create_run_results.pop_front().unwrap_or_else(exhausted)
    }

    async fn get_run(&self, _thread_id: &ThreadId, _run_id: &RunId) -> Result<Run, ApiError> {
        let mut state = self.state.lock().await;
        state.get_run_calls += 1;
        state.get_run_results.pop_front().unwrap_or_else(exhausted)
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &ThreadId,
        run_id: &RunId,
        outputs: &[ToolCallResult],
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.submitted_outputs.push((run_id.clone(), outputs.to_vec()));
        Ok(())
    }

    async fn list_messages(&self, _thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, ApiError> {
        let mut state = self.state.lock().await;
        state.list_messages_results.pop_front().unwrap_or_else(exhausted)
    }

    async fn chat_completion(&self, _model: &str, _user_input: &str) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;
        state.chat_replies.pop_front().unwrap_or_else(exhausted)
    }
}

pub fn working_run(run_id: &str, thread_id: &str, status: sundial_core::RunStatus) -> Run {
    Run {
        id: RunId(run_id.to_string()),
        thread_id: ThreadId(thread_id.to_string()),
        status,
        pending_tool_calls: Vec::new(),
    }
}

pub fn assistant_message(text: &str) -> ThreadMessage {
    ThreadMessage { role: MessageRole::Assistant, text: text.to_string(), created_at: None }
}

pub fn user_message(text: &str) -> ThreadMessage {
    ThreadMessage { role: MessageRole::User, text: text.to_string(), created_at: None }
}
