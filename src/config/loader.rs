//! Configuration loading from the command line and environment.

use std::ffi::OsString;

use clap::Parser;

use crate::config::schema::Config;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from process arguments and environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(std::env::args_os())
}

/// Load and validate configuration from explicit arguments (environment
/// variables still apply).
pub fn load_config_from<I, T>(args: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = Config::try_parse_from(args)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
