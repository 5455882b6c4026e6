use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use sundial_core::config::OpenAiConfig;
use sundial_core::{
    AssistantId, AssistantSpec, MessageRole, Run, RunId, ThreadId, ThreadMessage, ToolCallResult,
};

use crate::error::ApiError;
use crate::types::{
    AssistantObject, ChatCompletionRequest, ChatCompletionResponse, ChatRequestMessage,
    CreateAssistantRequest, CreateMessageRequest, CreateRunRequest, ListMessagesResponse,
    RunObject, SubmitToolOutputsRequest, ThreadObject, ToolOutputEntry,
};

/// Everything the engine and its collaborators may ask of the remote job
/// service. Message listings are returned newest first.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    async fn create_thread(&self) -> Result<ThreadId, ApiError>;
    async fn get_thread(&self, thread_id: &ThreadId) -> Result<ThreadId, ApiError>;
    async fn append_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), ApiError>;
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId, ApiError>;
    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, ApiError>;
    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, ApiError>;
    async fn submit_tool_outputs(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        outputs: &[ToolCallResult],
    ) -> Result<(), ApiError>;
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, ApiError>;
    async fn chat_completion(&self, model: &str, user_input: &str) -> Result<String, ApiError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestRetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RequestRetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl RequestRetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

pub struct HttpAssistantsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    retry: RequestRetryPolicy,
}

impl HttpAssistantsClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RequestRetryPolicy {
                max_retries: config.max_retries,
                ..RequestRetryPolicy::default()
            },
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response =
            builder.send().await.map_err(|error| ApiError::Transport(error.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }

        response.json::<T>().await.map_err(|error| ApiError::Decode(error.to_string()))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self.authorized(self.http.post(self.url(path))).json(body);
        self.execute(builder).await
    }

    /// GETs are idempotent, so transient failures are retried with
    /// exponential backoff before being surfaced.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            let builder = self.authorized(self.http.get(self.url(path)));
            match self.execute::<T>(builder).await {
                Err(error) if error.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        path,
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %error,
                        "remote read failed; retrying"
                    );
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                }
                other => return other,
            }
        }
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

#[async_trait]
impl AssistantsApi for HttpAssistantsClient {
    async fn create_thread(&self) -> Result<ThreadId, ApiError> {
        let thread: ThreadObject =
            self.post_json("threads", &serde_json::json!({})).await?;
        debug!(thread_id = %thread.id, "created remote thread");
        Ok(ThreadId(thread.id))
    }

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<ThreadId, ApiError> {
        let thread: ThreadObject = self.get_json(&format!("threads/{}", thread_id.0)).await?;
        Ok(ThreadId(thread.id))
    }

    async fn append_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), ApiError> {
        let request =
            CreateMessageRequest { role: role_name(role).to_string(), content: text.to_string() };
        let _: serde_json::Value =
            self.post_json(&format!("threads/{}/messages", thread_id.0), &request).await?;
        Ok(())
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId, ApiError> {
        let request = CreateAssistantRequest {
            name: spec.name.clone(),
            instructions: spec.instructions.clone(),
            model: spec.model.clone(),
            tools: spec.tools.clone(),
        };
        let assistant: AssistantObject = self.post_json("assistants", &request).await?;
        debug!(assistant_id = %assistant.id, "created remote assistant definition");
        Ok(AssistantId(assistant.id))
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, ApiError> {
        let request = CreateRunRequest { assistant_id: assistant_id.0.clone() };
        let run: RunObject =
            self.post_json(&format!("threads/{}/runs", thread_id.0), &request).await?;
        Ok(run.into_domain())
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, ApiError> {
        let run: RunObject =
            self.get_json(&format!("threads/{}/runs/{}", thread_id.0, run_id.0)).await?;
        Ok(run.into_domain())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        outputs: &[ToolCallResult],
    ) -> Result<(), ApiError> {
        let request = SubmitToolOutputsRequest {
            tool_outputs: outputs
                .iter()
                .map(|result| ToolOutputEntry {
                    tool_call_id: result.call_id.clone(),
                    output: result.output.clone(),
                })
                .collect(),
        };
        let _: serde_json::Value = self
            .post_json(
                &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id.0, run_id.0),
                &request,
            )
            .await?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, ApiError> {
        let listing: ListMessagesResponse =
            self.get_json(&format!("threads/{}/messages", thread_id.0)).await?;
        Ok(listing.data.into_iter().filter_map(|message| message.into_domain()).collect())
    }

    async fn chat_completion(&self, model: &str, user_input: &str) -> Result<String, ApiError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatRequestMessage {
                role: "user".to_string(),
                content: user_input.to_string(),
            }],
            temperature: 0.0,
        };
        let response: ChatCompletionResponse = self.post_json("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::Decode("completion response carried no content".to_string()))
    }
}
