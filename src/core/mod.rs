pub mod config;
pub mod error;
pub mod launch;
pub mod types;

pub use config::{LaunchSettings, SettingsSource};
pub use error::AppError;
pub use launch::{launch_pipeline, LaunchOutcome};
pub use types::*;
