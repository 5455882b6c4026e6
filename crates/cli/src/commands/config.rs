use secrecy::ExposeSecret;
use sundial_core::config::{AppConfig, LoadOptions, LogFormat};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line("database.url", &config.database.url));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
    ));
    lines.push(render_line("database.timeout_secs", &config.database.timeout_secs.to_string()));

    lines.push(render_line(
        "openai.api_key",
        &redact_secret(config.openai.api_key.expose_secret()),
    ));
    lines.push(render_line("openai.base_url", &config.openai.base_url));
    lines.push(render_line("openai.model", &config.openai.model));
    lines.push(render_line(
        "openai.assistant_id",
        config.openai.assistant_id.as_deref().unwrap_or("<fresh definition per request>"),
    ));
    lines.push(render_line("openai.timeout_secs", &config.openai.timeout_secs.to_string()));
    lines.push(render_line("openai.max_retries", &config.openai.max_retries.to_string()));

    lines.push(render_line("agent.assistant_name", &config.agent.assistant_name));
    lines.push(render_line("agent.timezone", &config.agent.timezone));
    lines.push(render_line(
        "agent.poll_interval_secs",
        &config.agent.poll_interval_secs.to_string(),
    ));
    lines.push(render_line(
        "agent.max_poll_attempts",
        &config.agent.max_poll_attempts.to_string(),
    ));

    lines.push(render_line("logging.level", &config.logging.level));
    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };
    lines.push(render_line("logging.format", format));

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("  {key} = {value}")
}

fn redact_secret(value: &str) -> String {
    if value.is_empty() {
        return "<unset>".to_string();
    }
    if value.len() <= 8 {
        return "********".to_string();
    }
    format!("{}****", &value[..4])
}
