use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use sundial_openai::AssistantsApi;

use crate::registry::Tool;

#[derive(Debug, Deserialize)]
struct ChatArgs {
    user_input: String,
    #[serde(default)]
    model: Option<String>,
}

/// Fallback for requests that need no calendar operation: a single
/// non-tool-augmented completion. Remote failures are folded into the
/// returned text so the run can still resume with this call's output.
pub struct ChatFallbackTool {
    api: Arc<dyn AssistantsApi>,
    default_model: String,
}

impl ChatFallbackTool {
    pub fn new(api: Arc<dyn AssistantsApi>, default_model: impl Into<String>) -> Self {
        Self { api, default_model: default_model.into() }
    }
}

#[async_trait]
impl Tool for ChatFallbackTool {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": "chat",
                "description": "Answer a request that needs no calendar operation",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "user_input": {"type": "string"},
                        "model": {"type": "string"}
                    },
                    "required": ["user_input"]
                }
            }
        })
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let args: ChatArgs = serde_json::from_value(Value::Object(args))?;
        let model = args.model.as_deref().unwrap_or(&self.default_model);

        match self.api.chat_completion(model, &args.user_input).await {
            Ok(text) => Ok(Value::String(text)),
            Err(error) => {
                warn!(model, error = %error, "chat completion failed; returning error text");
                Ok(Value::String(format!("chat request failed: {error}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use sundial_openai::ApiError;

    use super::ChatFallbackTool;
    use crate::registry::Tool;
    use crate::test_support::{ScriptedAssistantsApi, ScriptedState};

    #[tokio::test]
    async fn successful_completion_passes_text_through() {
        let api = Arc::new(ScriptedAssistantsApi::new(ScriptedState {
            chat_replies: vec![Ok("Hello there.".to_string())].into(),
            ..ScriptedState::default()
        }));
        let tool = ChatFallbackTool::new(api, "gpt-3.5-turbo");

        let args = json!({"user_input": "say hello"});
        let result =
            tool.invoke(args.as_object().expect("object literal").clone()).await.expect("invoke");

        assert_eq!(result, Value::String("Hello there.".to_string()));
    }

    #[tokio::test]
    async fn remote_failure_becomes_error_text_not_an_error() {
        let api = Arc::new(ScriptedAssistantsApi::new(ScriptedState {
            chat_replies: vec![Err(ApiError::Status { status: 500, body: "boom".to_string() })]
                .into(),
            ..ScriptedState::default()
        }));
        let tool = ChatFallbackTool::new(api, "gpt-3.5-turbo");

        let args = json!({"user_input": "say hello"});
        let result =
            tool.invoke(args.as_object().expect("object literal").clone()).await.expect("invoke");

        let text = result.as_str().expect("text output");
        assert!(text.starts_with("chat request failed:"));
    }
}
