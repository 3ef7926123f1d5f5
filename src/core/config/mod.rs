pub mod loader;

pub use loader::ConfigLoader;

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

pub const ENV_ACCESS_TOKEN: &str = "SEQERA_ACCESS_TOKEN";
pub const ENV_ACTION_ID: &str = "SEQERA_ACTION_ID";
pub const ENV_WORKSPACE_ID: &str = "SEQERA_WORKSPACE_ID";
pub const ENV_API_BASE: &str = "SEQERA_API_BASE";
pub const ENV_ORG_NAME: &str = "SEQERA_ORG_NAME";
pub const ENV_WORKSPACE_NAME: &str = "SEQERA_WORKSPACE_NAME";
pub const ENV_WEB_BASE: &str = "SEQERA_WEB_BASE";

pub const DEFAULT_API_BASE: &str = "https://api.cloud.stage-seqera.io";
pub const DEFAULT_WEB_BASE: &str = "https://cloud.stage-seqera.io";

/// Known API hosts and the web consoles that render their runs.
const KNOWN_WEB_BASES: &[(&str, &str)] = &[
    ("api.cloud.stage-seqera.io", "https://cloud.stage-seqera.io"),
    ("api.cloud.seqera.io", "https://cloud.seqera.io"),
];

/// Settings file loaded through `--config`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudioConfig {
    /// Seqera Platform defaults, overridden by `SEQERA_*` variables
    #[serde(default)]
    pub seqera: SeqeraSection,

    /// Logging sinks and level
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[seqera]` table. Every key mirrors one `SEQERA_*` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SeqeraSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_base: Option<String>,
}

/// `[logging]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LoggingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Where environment values come from.
#[derive(Debug, Clone)]
pub enum EnvSource {
    /// The live process environment, read on every lookup.
    Process,
    /// A fixed map, used by embedders and tests.
    Map(HashMap<String, String>),
}

impl EnvSource {
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            EnvSource::Process => env::var(key).ok(),
            EnvSource::Map(values) => values.get(key).cloned(),
        }
    }
}

/// Produces a fresh [`LaunchSettings`] snapshot for each launch request.
#[derive(Debug, Clone)]
pub struct SettingsSource {
    defaults: SeqeraSection,
    env: EnvSource,
}

impl SettingsSource {
    pub fn new(defaults: SeqeraSection, env: EnvSource) -> Self {
        SettingsSource { defaults, env }
    }

    /// Process environment layered over optional file defaults.
    pub fn from_process(defaults: SeqeraSection) -> Self {
        Self::new(defaults, EnvSource::Process)
    }

    /// Fixed key/value pairs without file defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(SeqeraSection::default(), EnvSource::Map(values))
    }

    pub fn snapshot(&self) -> LaunchSettings {
        LaunchSettings::resolve(&self.defaults, |key| self.env.get(key))
    }
}

/// Configuration visible to one launch request.
///
/// Blank strings are normalized to `None`, except `api_base`, which only
/// falls back to the default when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSettings {
    pub access_token: Option<String>,
    pub action_id: Option<String>,
    pub workspace_id: Option<String>,
    pub api_base: String,
    pub org_name: Option<String>,
    pub workspace_name: Option<String>,
    pub web_base: Option<String>,
}

impl LaunchSettings {
    /// Resolve settings with precedence: built-in defaults < file < environment.
    ///
    /// A variable that is set but empty still overrides the file value.
    pub fn resolve<F>(defaults: &SeqeraSection, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: &Option<String>| -> Option<String> {
            lookup(key).or_else(|| fallback.clone())
        };

        // a set-but-blank API base is kept and fails when the client is built
        let api_base = pick(ENV_API_BASE, &defaults.api_base)
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let web_override = pick(ENV_WEB_BASE, &defaults.web_base);
        let web_base = resolve_web_base(&api_base, web_override);

        LaunchSettings {
            access_token: pick(ENV_ACCESS_TOKEN, &defaults.access_token).and_then(non_blank),
            action_id: pick(ENV_ACTION_ID, &defaults.action_id).and_then(non_blank),
            workspace_id: pick(ENV_WORKSPACE_ID, &defaults.workspace_id).and_then(non_blank),
            api_base,
            org_name: pick(ENV_ORG_NAME, &defaults.org_name).and_then(non_blank),
            workspace_name: pick(ENV_WORKSPACE_NAME, &defaults.workspace_name)
                .and_then(non_blank),
            web_base,
        }
    }

    /// Names of required variables that are missing, in declaration order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_token.is_none() {
            missing.push(ENV_ACCESS_TOKEN);
        }
        if self.action_id.is_none() {
            missing.push(ENV_ACTION_ID);
        }
        if self.workspace_id.is_none() {
            missing.push(ENV_WORKSPACE_ID);
        }
        missing
    }

    /// Split into the values needed to call the platform, or fail naming what is absent.
    #[allow(clippy::result_large_err)]
    pub fn require(&self) -> Result<LaunchTarget, AppError> {
        match (&self.access_token, &self.action_id, &self.workspace_id) {
            (Some(token), Some(action_id), Some(workspace_id)) => Ok(LaunchTarget {
                access_token: token.clone(),
                action_id: action_id.clone(),
                workspace_id: workspace_id.clone(),
                api_base: self.api_base.trim_end_matches('/').to_string(),
            }),
            _ => Err(AppError::new(
                ErrorCategory::ConfigurationError,
                format!(
                    "Missing required environment variables: {}",
                    self.missing_required().join(", ")
                ),
            )
            .with_code("LAUNCH-CONFIG-400")),
        }
    }
}

/// Validated values for the launch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub access_token: String,
    pub action_id: String,
    pub workspace_id: String,
    pub api_base: String,
}

/// Pick the web console for an API base.
///
/// Known Seqera API hosts map to their console; anything else uses the
/// override, falling back to the staging console when no override is set.
pub fn resolve_web_base(api_base: &str, web_override: Option<String>) -> Option<String> {
    if let Some((_, web)) = KNOWN_WEB_BASES
        .iter()
        .find(|(api_host, _)| api_base.contains(api_host))
    {
        return Some((*web).to_string());
    }
    match web_override {
        Some(value) => non_blank(value),
        None => Some(DEFAULT_WEB_BASE.to_string()),
    }
    .map(|web| web.trim_end_matches('/').to_string())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
