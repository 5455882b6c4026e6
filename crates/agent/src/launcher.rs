use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use sundial_core::config::AppConfig;
use sundial_core::{AssistantId, AssistantSpec, MessageRole, Run, ThreadId};
use sundial_openai::{ApiError, AssistantsApi};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("timezone `{0}` is not a recognized IANA zone name")]
    Timezone(String),
    #[error("assistant creation failed: {0}")]
    AssistantCreate(ApiError),
    #[error("message append failed: {0}")]
    MessageAppend(ApiError),
    #[error("run creation failed: {0}")]
    RunCreate(ApiError),
}

/// Attaches a user message to a thread and starts a run. The assistant
/// definition is rendered fresh per request so its instructions carry
/// today's date in the configured zone; a configured `assistant_id` skips
/// that and reuses the remote definition as-is, stale date included.
pub struct JobLauncher {
    api: Arc<dyn AssistantsApi>,
    assistant_name: String,
    timezone: String,
    model: String,
    assistant_id: Option<AssistantId>,
    tool_schemas: Vec<Value>,
}

impl JobLauncher {
    pub fn new(api: Arc<dyn AssistantsApi>, config: &AppConfig, tool_schemas: Vec<Value>) -> Self {
        Self {
            api,
            assistant_name: config.agent.assistant_name.clone(),
            timezone: config.agent.timezone.clone(),
            model: config.openai.model.clone(),
            assistant_id: config.openai.assistant_id.clone().map(AssistantId),
            tool_schemas,
        }
    }

    pub async fn start_run(
        &self,
        thread_id: &ThreadId,
        user_input: &str,
    ) -> Result<Run, LaunchError> {
        let assistant_id = match &self.assistant_id {
            Some(id) => {
                debug!(assistant_id = %id, "reusing configured assistant definition");
                id.clone()
            }
            None => {
                // Rendering happens before any remote call so a bad zone name
                // never leaves half a launch behind.
                let spec = self.render_spec()?;
                self.api.create_assistant(&spec).await.map_err(LaunchError::AssistantCreate)?
            }
        };

        self.api
            .append_message(thread_id, MessageRole::User, user_input)
            .await
            .map_err(LaunchError::MessageAppend)?;

        let run = self
            .api
            .create_run(thread_id, &assistant_id)
            .await
            .map_err(LaunchError::RunCreate)?;

        info!(
            run_id = %run.id,
            thread_id = %thread_id,
            status = %run.status,
            "run started"
        );

        Ok(run)
    }

    /// Assistant definition for this request, instructions parameterized by
    /// today's date in the configured zone.
    pub fn render_spec(&self) -> Result<AssistantSpec, LaunchError> {
        let zone = self
            .timezone
            .parse::<Tz>()
            .map_err(|_| LaunchError::Timezone(self.timezone.clone()))?;
        let today = Utc::now().with_timezone(&zone).format("%Y-%m-%d");

        let instructions = format!(
            "You are a helpful AI. You have the ability to schedule events in a calendar. \
             Assume today's date is {today} and the timezone is {zone}."
        );

        Ok(AssistantSpec {
            name: self.assistant_name.clone(),
            instructions,
            model: self.model.clone(),
            tools: self.tool_schemas.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use sundial_core::config::AppConfig;
    use sundial_core::{AssistantId, MessageRole, RunStatus, ThreadId};
    use sundial_openai::ApiError;

    use super::{JobLauncher, LaunchError};
    use crate::test_support::{working_run, ScriptedAssistantsApi, ScriptedState};

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.openai.api_key = "sk-test".to_string().into();
        config
    }

    fn tool_schemas() -> Vec<serde_json::Value> {
        vec![json!({"type": "function", "function": {"name": "list_events"}})]
    }

    #[tokio::test]
    async fn fresh_launch_creates_assistant_then_appends_then_runs() {
        let api = Arc::new(ScriptedAssistantsApi::new(ScriptedState {
            create_assistant_results: vec![Ok(AssistantId("asst_1".to_string()))].into(),
            create_run_results: vec![Ok(working_run("run_1", "T1", RunStatus::Queued))].into(),
            ..ScriptedState::default()
        }));
        let launcher = JobLauncher::new(api.clone(), &test_config(), tool_schemas());
        let thread_id = ThreadId("T1".to_string());

        let run = launcher.start_run(&thread_id, "book a meeting tomorrow").await.expect("launch");
        assert_eq!(run.id.0, "run_1");
        assert_eq!(run.status, RunStatus::Queued);

        let specs = api.created_specs().await;
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "Sundial Scheduler");
        assert_eq!(specs[0].model, "gpt-3.5-turbo");
        assert_eq!(specs[0].tools, tool_schemas());

        let appended = api.appended_messages().await;
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].1, MessageRole::User);
        assert_eq!(appended[0].2, "book a meeting tomorrow");
    }

    #[tokio::test]
    async fn configured_assistant_id_skips_definition_creation() {
        let api = Arc::new(ScriptedAssistantsApi::new(ScriptedState {
            create_run_results: vec![Ok(working_run("run_2", "T1", RunStatus::Queued))].into(),
            ..ScriptedState::default()
        }));
        let mut config = test_config();
        config.openai.assistant_id = Some("asst_fixed".to_string());

        let launcher = JobLauncher::new(api.clone(), &config, tool_schemas());
        launcher.start_run(&ThreadId("T1".to_string()), "hi").await.expect("launch");

        assert!(api.created_specs().await.is_empty());
    }

    #[tokio::test]
    async fn append_failure_aborts_the_launch() {
        let api = Arc::new(ScriptedAssistantsApi::new(ScriptedState {
            create_assistant_results: vec![Err(ApiError::Status {
                status: 500,
                body: "definition rejected".to_string(),
            })]
            .into(),
            ..ScriptedState::default()
        }));
        let launcher = JobLauncher::new(api, &test_config(), tool_schemas());

        let error = launcher
            .start_run(&ThreadId("T1".to_string()), "hi")
            .await
            .expect_err("assistant creation failed");
        assert!(matches!(error, LaunchError::AssistantCreate(_)));
    }

    #[test]
    fn rendered_instructions_carry_date_and_zone() {
        let launcher =
            JobLauncher::new(Arc::new(ScriptedAssistantsApi::default()), &test_config(), vec![]);

        let spec = launcher.render_spec().expect("render");
        assert!(spec.instructions.contains("America/Los_Angeles"));
        assert!(spec.instructions.contains("today's date is 2"));
    }

    #[test]
    fn unknown_zone_fails_before_any_remote_call() {
        let mut config = test_config();
        config.agent.timezone = "Nowhere/Void".to_string();

        let launcher =
            JobLauncher::new(Arc::new(ScriptedAssistantsApi::default()), &config, vec![]);

        let error = launcher.render_spec().expect_err("bad zone");
        assert!(matches!(error, LaunchError::Timezone(zone) if zone == "Nowhere/Void"));
    }
}
