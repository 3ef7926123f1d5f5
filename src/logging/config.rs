use crate::core::config::LoggingSection;
use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::anyhow;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

const DEFAULT_LEVEL: &str = "info";
const DEBUG_LEVEL: &str = "debug";

/// Environment override for the log directory; enables the file sink.
pub const ENV_LOG_DIR: &str = "STUDIO_LAUNCH_LOG_DIR";

/// Line format shared by every sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "invalid logging.format '{}'; supported values are text, json",
                value
            )),
        }
    }
}

/// Resolved logging configuration after reading the settings file and env overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub default_level: String,
    pub console_output: ConsoleOutput,
    pub log_dir: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_LEVEL.to_string(),
            console_output: ConsoleOutput::default(),
            log_dir: None,
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Load configuration with deterministic precedence: defaults, settings file, env, `--debug`.
    pub fn load(section: &LoggingSection, debug: bool) -> Result<Self> {
        let mut config = LoggingConfig::default();
        config.apply(section)?;
        config.apply_env_overrides();
        if debug {
            config.default_level = DEBUG_LEVEL.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, section: &LoggingSection) -> Result<()> {
        if let Some(level) = &section.default_level {
            self.default_level = level.clone();
        }
        if let Some(output) = &section.console_output {
            self.console_output = output.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(log_dir) = &section.log_dir {
            self.log_dir = Some(log_dir.clone());
        }
        if let Some(format) = &section.format {
            self.format = format.parse().map_err(|e: String| anyhow!(e))?;
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var(ENV_LOG_DIR) {
            if !dir.trim().is_empty() {
                self.log_dir = Some(PathBuf::from(dir));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level)
            .map_err(|_| anyhow!("logging.default_level must be a valid tracing directive"))?;
        Ok(())
    }
}
