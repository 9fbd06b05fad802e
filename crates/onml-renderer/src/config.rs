use serde::Deserialize;
use smartstring::alias::String as SmartString;
use thiserror::Error;

pub const DEFAULT_ROOT_ID: &str = "<default>";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "nope"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("log_level must be one of: trace, debug, info, warn, error, nope (got '{0}')")]
    InvalidLogLevel(String),

    #[error("Malformed renderer config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Root used by `render` when no root id is given
    pub default_root_id: SmartString,
    /// Simulated time spent per `time_remaining()` call
    pub deadline_step: u64,
    /// Commit updates immediately instead of waiting for a flush
    pub use_sync_scheduling: bool,
    /// Keep every non-children prop on instances, not only `prop`
    pub retain_attributes: bool,
    pub log_level: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            default_root_id: DEFAULT_ROOT_ID.into(),
            deadline_step: 5,
            use_sync_scheduling: true,
            retain_attributes: false,
            log_level: "info".to_string(),
        }
    }
}

impl RendererConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: RendererConfig = serde_json::from_str(json)?;
        config.log_level = parse_log_level(&config.log_level)?;
        Ok(config)
    }

    /// Defaults overridden by `<PREFIX>_*` environment variables
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_vars(prefix, |key| std::env::var(key).ok())
    }

    fn from_vars(
        prefix: &str,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let key = |name: &str| format!("{}_{}", prefix, name);

        if let Some(value) = var(&key("DEFAULT_ROOT_ID")) {
            config.default_root_id = value.as_str().into();
        }
        if let Some(value) = var(&key("DEADLINE_STEP")) {
            config.deadline_step =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: key("DEADLINE_STEP"),
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = var(&key("USE_SYNC_SCHEDULING")) {
            config.use_sync_scheduling = parse_bool(&key("USE_SYNC_SCHEDULING"), &value)?;
        }
        if let Some(value) = var(&key("RETAIN_ATTRIBUTES")) {
            config.retain_attributes = parse_bool(&key("RETAIN_ATTRIBUTES"), &value)?;
        }
        if let Some(value) = var(&key("LOG_LEVEL")) {
            config.log_level = parse_log_level(&value)?;
        }

        Ok(config)
    }

    pub fn logging_enabled(&self) -> bool {
        self.log_level != "nope"
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_log_level(value: &str) -> Result<String, ConfigError> {
    let level = value.trim().to_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(ConfigError::InvalidLogLevel(value.to_string()))
    }
}
