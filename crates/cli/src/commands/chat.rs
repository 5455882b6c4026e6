use std::io::{self, BufRead, Write};
use std::sync::Arc;

use sundial_agent::tools::NoopCalendarApi;
use sundial_agent::RequestOrchestrator;
use sundial_core::config::{AppConfig, LoadOptions, LogFormat};
use sundial_core::LookupKey;
use sundial_db::repositories::SqlThreadLinkRepository;
use sundial_db::{connect_with_settings, migrations};
use sundial_openai::HttpAssistantsClient;

use crate::commands::CommandResult;

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    // Best effort: a second init in the same process (e.g. tests) is a no-op.
    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Stable per-user lookup key so the conversation thread survives restarts.
fn session_lookup_key() -> LookupKey {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "default".to_string());
    LookupKey(format!("cli:{user}"))
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let orchestrator = match runtime.block_on(build_orchestrator(&config)) {
        Ok(orchestrator) => orchestrator,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("chat", error_class, message, exit_code);
        }
    };

    let lookup_key = session_lookup_key();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Please enter your request (or type 'exit'): ");
        let _ = io::stdout().flush();

        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            println!("Exiting the program.");
            break;
        }

        match runtime.block_on(orchestrator.process(input, &lookup_key)) {
            Ok(reply) => println!("{reply}"),
            Err(error) => {
                tracing::warn!(correlation_id = error.correlation_id(), "request returned no reply");
                println!("{}", error.user_message());
            }
        }
    }

    CommandResult::success("chat", "interactive session ended")
}

async fn build_orchestrator(
    config: &AppConfig,
) -> Result<RequestOrchestrator, (&'static str, String, u8)> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), 5u8))?;

    let api = HttpAssistantsClient::new(&config.openai)
        .map_err(|error| ("openai_client", error.to_string(), 4u8))?;

    Ok(RequestOrchestrator::build(
        config,
        Arc::new(SqlThreadLinkRepository::new(pool)),
        Arc::new(api),
        Arc::new(NoopCalendarApi),
    ))
}
