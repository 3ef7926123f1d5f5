use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
{after-help}\n";

const AFTER_HELP: &str = "\
ENVIRONMENT:
    SEQERA_ACCESS_TOKEN     Platform access token (required)
    SEQERA_ACTION_ID        Action to launch (required)
    SEQERA_WORKSPACE_ID     Workspace that owns the action (required)
    SEQERA_API_BASE         API base URL (default: https://api.cloud.stage-seqera.io)
    SEQERA_ORG_NAME         Fallback organization name for run links
    SEQERA_WORKSPACE_NAME   Fallback workspace name for run links
    SEQERA_WEB_BASE         Web console URL for custom API hosts

EXAMPLES:
    studio-launch --port 8080
    studio-launch --config studio.toml --debug";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "studio-launch")]
#[command(version = crate::VERSION)]
#[command(about = "Studios Launch Page: trigger a Seqera Action from a web page")]
#[command(help_template = HELP_TEMPLATE)]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    /// Host to bind to (default: 0.0.0.0)
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind to (default: 5000)
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Enable debug mode (DEBUG accepts true, 1 or yes)
    #[arg(long, env = "DEBUG", action = ArgAction::SetTrue, value_parser = parse_debug_flag)]
    pub debug: bool,

    /// Optional TOML settings file with [seqera] and [logging] tables
    #[arg(long, env = "STUDIO_LAUNCH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Only `true`, `1` and `yes` (any case) switch debug mode on.
pub fn parse_debug_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}
