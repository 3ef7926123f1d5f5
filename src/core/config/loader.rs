#![allow(clippy::result_large_err)]

use super::StudioConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::path::Path;
use url::Url;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the settings file passed on the command line.
    ///
    /// A missing path is an error here since the operator asked for it explicitly.
    pub fn load_required(path: &Path) -> Result<StudioConfig, AppError> {
        Self::load_from_file(path)?.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigurationError,
                format!("Config file {} does not exist", path.display()),
            )
        })
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<StudioConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config = Self::parse(&content).map_err(|mut e| {
            e.add_context("path", &path.display().to_string());
            e
        })?;
        Ok(Some(config))
    }

    /// Parse and validate TOML settings.
    pub fn parse(content: &str) -> Result<StudioConfig, AppError> {
        let config: StudioConfig = toml::from_str(content).map_err(|e| {
            AppError::with_source(
                ErrorCategory::SerializationError,
                "Failed to parse config file",
                Box::new(e),
            )
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &StudioConfig) -> Result<(), AppError> {
        for (key, value) in [
            ("seqera.api_base", &config.seqera.api_base),
            ("seqera.web_base", &config.seqera.web_base),
        ] {
            if let Some(raw) = value {
                if raw.trim().is_empty() {
                    continue;
                }
                Url::parse(raw).map_err(|e| {
                    AppError::new(
                        ErrorCategory::ConfigurationError,
                        format!("{} must be an absolute URL: {}", key, e),
                    )
                })?;
            }
        }
        Ok(())
    }
}
