use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub openai: OpenAiConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    /// When set, the launcher reuses this assistant definition instead of
    /// creating a fresh one per request. The reused definition keeps the
    /// date its instructions were rendered with.
    pub assistant_id: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub assistant_name: String,
    pub timezone: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub assistant_id: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://sundial.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            openai: OpenAiConfig {
                api_key: String::new().into(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                assistant_id: None,
                timeout_secs: 30,
                max_retries: 2,
            },
            agent: AgentConfig {
                assistant_name: "Sundial Scheduler".to_string(),
                timezone: "America/Los_Angeles".to_string(),
                poll_interval_secs: 5,
                max_poll_attempts: 60,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AgentConfig {
    /// Resolve the configured IANA zone name. Validation runs this at load
    /// time, so failures here are fatal before any remote interaction.
    pub fn resolve_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Validation(format!(
                "agent.timezone `{}` is not a recognized IANA zone name",
                self.timezone
            ))
        })
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("sundial.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(openai) = patch.openai {
            if let Some(api_key_value) = openai.api_key {
                self.openai.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = openai.base_url {
                self.openai.base_url = base_url;
            }
            if let Some(model) = openai.model {
                self.openai.model = model;
            }
            if let Some(assistant_id) = openai.assistant_id {
                self.openai.assistant_id = Some(assistant_id);
            }
            if let Some(timeout_secs) = openai.timeout_secs {
                self.openai.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = openai.max_retries {
                self.openai.max_retries = max_retries;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(assistant_name) = agent.assistant_name {
                self.agent.assistant_name = assistant_name;
            }
            if let Some(timezone) = agent.timezone {
                self.agent.timezone = timezone;
            }
            if let Some(poll_interval_secs) = agent.poll_interval_secs {
                self.agent.poll_interval_secs = poll_interval_secs;
            }
            if let Some(max_poll_attempts) = agent.max_poll_attempts {
                self.agent.max_poll_attempts = max_poll_attempts;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SUNDIAL_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SUNDIAL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("SUNDIAL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SUNDIAL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("SUNDIAL_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SUNDIAL_OPENAI_API_KEY") {
            self.openai.api_key = secret_value(value);
        }
        if let Some(value) = read_env("SUNDIAL_OPENAI_BASE_URL") {
            self.openai.base_url = value;
        }
        if let Some(value) = read_env("SUNDIAL_OPENAI_MODEL") {
            self.openai.model = value;
        }
        if let Some(value) = read_env("SUNDIAL_OPENAI_ASSISTANT_ID") {
            self.openai.assistant_id = Some(value);
        }
        if let Some(value) = read_env("SUNDIAL_OPENAI_TIMEOUT_SECS") {
            self.openai.timeout_secs = parse_u64("SUNDIAL_OPENAI_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SUNDIAL_OPENAI_MAX_RETRIES") {
            self.openai.max_retries = parse_u32("SUNDIAL_OPENAI_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("SUNDIAL_AGENT_ASSISTANT_NAME") {
            self.agent.assistant_name = value;
        }
        if let Some(value) = read_env("SUNDIAL_AGENT_TIMEZONE") {
            self.agent.timezone = value;
        }
        if let Some(value) = read_env("SUNDIAL_AGENT_POLL_INTERVAL_SECS") {
            self.agent.poll_interval_secs =
                parse_u64("SUNDIAL_AGENT_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("SUNDIAL_AGENT_MAX_POLL_ATTEMPTS") {
            self.agent.max_poll_attempts =
                parse_u32("SUNDIAL_AGENT_MAX_POLL_ATTEMPTS", &value)?;
        }

        let log_level = read_env("SUNDIAL_LOGGING_LEVEL").or_else(|| read_env("SUNDIAL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SUNDIAL_LOGGING_FORMAT").or_else(|| read_env("SUNDIAL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(api_key) = overrides.openai_api_key {
            self.openai.api_key = secret_value(api_key);
        }
        if let Some(model) = overrides.openai_model {
            self.openai.model = model;
        }
        if let Some(assistant_id) = overrides.assistant_id {
            self.openai.assistant_id = Some(assistant_id);
        }
        if let Some(timezone) = overrides.timezone {
            self.agent.timezone = timezone;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_openai(&self.openai)?;
        validate_agent(&self.agent)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("sundial.toml"), PathBuf::from("config/sundial.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_openai(openai: &OpenAiConfig) -> Result<(), ConfigError> {
    if openai.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "openai.api_key is required (set it in sundial.toml or SUNDIAL_OPENAI_API_KEY)"
                .to_string(),
        ));
    }

    if openai.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("openai.base_url must not be empty".to_string()));
    }

    if openai.model.trim().is_empty() {
        return Err(ConfigError::Validation("openai.model must not be empty".to_string()));
    }

    if openai.timeout_secs == 0 || openai.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "openai.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    if agent.assistant_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "agent.assistant_name must not be empty".to_string(),
        ));
    }

    agent.resolve_timezone()?;

    // 1s floor: nothing may poll the remote service faster than this.
    if agent.poll_interval_secs == 0 || agent.poll_interval_secs > 300 {
        return Err(ConfigError::Validation(
            "agent.poll_interval_secs must be in range 1..=300".to_string(),
        ));
    }

    if agent.max_poll_attempts == 0 {
        return Err(ConfigError::Validation(
            "agent.max_poll_attempts must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    openai: Option<OpenAiPatch>,
    agent: Option<AgentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    assistant_id: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    assistant_name: Option<String>,
    timezone: Option<String>,
    poll_interval_secs: Option<u64>,
    max_poll_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
