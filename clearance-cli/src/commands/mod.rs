//! Command handlers -- one module per subcommand

pub mod archive;
pub mod config;
pub mod curate;
pub mod rules;

use std::path::Path;

use clearance_core::config::ClearanceConfig;
use clearance_curator::CuratorConfig;

use crate::error::CliError;

/// Load `clearance.toml` with env overrides and derive the curator settings.
pub(crate) fn load_config(path: &Path) -> Result<(ClearanceConfig, CuratorConfig), CliError> {
    let config = ClearanceConfig::load(path).map_err(|e| CliError::Config(e.to_string()))?;
    let curator = CuratorConfig::from_core(&config);
    curator.validate()?;
    Ok((config, curator))
}
