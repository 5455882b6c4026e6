use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use sundial_core::config::AppConfig;
use sundial_core::errors::{ApplicationError, InterfaceError};
use sundial_core::LookupKey;
use sundial_db::repositories::ThreadLinkRepository;
use sundial_openai::AssistantsApi;

use crate::engine::{PollPolicy, RunFailure, RunResolutionEngine};
use crate::launcher::{JobLauncher, LaunchError};
use crate::resolver::{ResolveError, ThreadResolver};
use crate::tools::{default_registry, CalendarApi};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Run(#[from] RunFailure),
}

impl AgentError {
    fn classify(&self) -> ApplicationError {
        match self {
            Self::Resolve(ResolveError::Store(error)) => {
                ApplicationError::Persistence(error.to_string())
            }
            Self::Resolve(error) => ApplicationError::Integration(error.to_string()),
            Self::Launch(LaunchError::Timezone(zone)) => {
                ApplicationError::Configuration(format!("unrecognized timezone `{zone}`"))
            }
            Self::Launch(error) => ApplicationError::Integration(error.to_string()),
            Self::Run(RunFailure::EmptyReply { run_id }) => ApplicationError::Protocol(format!(
                "run {run_id} completed without an assistant reply"
            )),
            Self::Run(error) => ApplicationError::Integration(error.to_string()),
        }
    }
}

/// Handles one user request end to end: thread resolution, run launch, run
/// resolution. Every stage failure is contained here, so callers get either
/// the assistant's final text or a single well-defined failure.
pub struct RequestOrchestrator {
    resolver: ThreadResolver,
    launcher: JobLauncher,
    engine: RunResolutionEngine,
}

impl RequestOrchestrator {
    pub fn new(
        resolver: ThreadResolver,
        launcher: JobLauncher,
        engine: RunResolutionEngine,
    ) -> Self {
        Self { resolver, launcher, engine }
    }

    /// Wire the full stack from its external collaborators. The registry is
    /// built once here and shared read-only between the launcher (schemas)
    /// and the engine (dispatch).
    pub fn build(
        config: &AppConfig,
        store: Arc<dyn ThreadLinkRepository>,
        api: Arc<dyn AssistantsApi>,
        calendar: Arc<dyn CalendarApi>,
    ) -> Self {
        let registry =
            Arc::new(default_registry(api.clone(), calendar, &config.openai.model));
        let resolver = ThreadResolver::new(store, api.clone());
        let launcher = JobLauncher::new(api.clone(), config, registry.schemas());
        let engine =
            RunResolutionEngine::new(api, registry, PollPolicy::from_config(&config.agent));

        Self::new(resolver, launcher, engine)
    }

    /// Full-fidelity variant: the error names what stage failed, scrubbed to
    /// the user-safe boundary type.
    pub async fn process(
        &self,
        user_input: &str,
        lookup_key: &LookupKey,
    ) -> Result<String, InterfaceError> {
        let correlation_id = Uuid::new_v4().to_string();

        match self.process_inner(user_input, lookup_key, &correlation_id).await {
            Ok(reply) => Ok(reply),
            Err(error) => {
                warn!(
                    correlation_id = %correlation_id,
                    lookup_key = %lookup_key,
                    error = %error,
                    "request failed; containing at the orchestrator boundary"
                );
                Err(error.classify().into_interface(correlation_id))
            }
        }
    }

    /// The contract the interactive front end consumes: final text or
    /// nothing.
    pub async fn handle(&self, user_input: &str, lookup_key: &LookupKey) -> Option<String> {
        self.process(user_input, lookup_key).await.ok()
    }

    async fn process_inner(
        &self,
        user_input: &str,
        lookup_key: &LookupKey,
        correlation_id: &str,
    ) -> Result<String, AgentError> {
        let thread_id = self.resolver.resolve_or_create(lookup_key).await?;
        let run = self.launcher.start_run(&thread_id, user_input).await?;

        info!(
            correlation_id,
            thread_id = %thread_id,
            run_id = %run.id,
            "request dispatched; resolving run"
        );

        let reply = self.engine.resolve(&run).await?;
        Ok(reply)
    }
}
