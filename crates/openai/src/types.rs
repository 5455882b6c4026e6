//! Wire-level shapes for the assistants-style HTTP API. Domain code never
//! sees these; conversions at the bottom map them onto `sundial-core` types.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sundial_core::{
    MessageRole, Run, RunId, RunStatus, ThreadId, ThreadMessage, ToolArguments, ToolCallRequest,
};

#[derive(Debug, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: String,
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub data: Vec<MessageObject>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantObject {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
}

#[derive(Debug, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub submit_tool_outputs: Option<SubmitToolOutputsAction>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitToolOutputsAction {
    pub tool_calls: Vec<RequiredToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct RequiredToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: ToolArguments,
}

#[derive(Debug, Serialize)]
pub struct SubmitToolOutputsRequest {
    pub tool_outputs: Vec<ToolOutputEntry>,
}

#[derive(Debug, Serialize)]
pub struct ToolOutputEntry {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatRequestMessage>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatRequestMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl RunObject {
    pub fn into_domain(self) -> Run {
        let pending_tool_calls = self
            .required_action
            .and_then(|action| action.submit_tool_outputs)
            .map(|outputs| {
                outputs
                    .tool_calls
                    .into_iter()
                    .map(|call| ToolCallRequest {
                        call_id: call.id,
                        name: call.function.name,
                        arguments: call.function.arguments,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Run {
            id: RunId(self.id),
            thread_id: ThreadId(self.thread_id),
            status: self.status,
            pending_tool_calls,
        }
    }
}

impl MessageObject {
    pub fn into_domain(self) -> Option<ThreadMessage> {
        let role = match self.role.as_str() {
            "assistant" => MessageRole::Assistant,
            "user" => MessageRole::User,
            _ => return None,
        };

        let text = self
            .content
            .into_iter()
            .filter(|segment| segment.content_type == "text")
            .filter_map(|segment| segment.text)
            .map(|text| text.value)
            .collect::<Vec<_>>()
            .join("\n");

        let created_at =
            self.created_at.and_then(|seconds| DateTime::from_timestamp(seconds, 0));

        Some(ThreadMessage { role, text, created_at })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sundial_core::{MessageRole, RunStatus};

    use super::{ListMessagesResponse, RunObject};

    #[test]
    fn stalled_run_decodes_pending_tool_calls() {
        let raw = json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_c1",
                        "type": "function",
                        "function": {
                            "name": "add_calendar_event",
                            "arguments": "{\"event_summary\":\"standup\"}"
                        }
                    }]
                }
            }
        });

        let run = serde_json::from_value::<RunObject>(raw).expect("decode run").into_domain();
        assert_eq!(run.status, RunStatus::RequiresAction);
        assert_eq!(run.pending_tool_calls.len(), 1);
        assert_eq!(run.pending_tool_calls[0].call_id, "call_c1");
        assert_eq!(run.pending_tool_calls[0].name, "add_calendar_event");

        let args = run.pending_tool_calls[0].arguments.decode().expect("decode args");
        assert_eq!(args.get("event_summary").and_then(|v| v.as_str()), Some("standup"));
    }

    #[test]
    fn working_run_has_no_pending_calls() {
        let raw = json!({"id": "run_2", "thread_id": "thread_1", "status": "in_progress"});
        let run = serde_json::from_value::<RunObject>(raw).expect("decode run").into_domain();
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.pending_tool_calls.is_empty());
    }

    #[test]
    fn message_listing_flattens_text_segments_and_skips_foreign_roles() {
        let raw = json!({
            "data": [
                {
                    "id": "msg_2",
                    "role": "assistant",
                    "created_at": 1714000000,
                    "content": [
                        {"type": "text", "text": {"value": "Booked it.", "annotations": []}},
                        {"type": "image_file", "text": null}
                    ]
                },
                {
                    "id": "msg_1",
                    "role": "system",
                    "content": [{"type": "text", "text": {"value": "hidden", "annotations": []}}]
                }
            ]
        });

        let listing = serde_json::from_value::<ListMessagesResponse>(raw).expect("decode listing");
        let messages: Vec<_> =
            listing.data.into_iter().filter_map(|message| message.into_domain()).collect();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert_eq!(messages[0].text, "Booked it.");
        assert!(messages[0].created_at.is_some());
    }
}
