//! `clearance config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use clearance_core::config::ClearanceConfig;
use clearance_curator::CuratorConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Configuration sections accepted by `config show --section`.
const SECTIONS: [&str; 4] = ["general", "scope", "curation", "dedup"];

/// Execute the `config` command.
pub fn execute(args: ConfigArgs, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer),
        ConfigAction::Show { section } => execute_show(config_path, section, writer),
    }
}

/// Load the file, apply env overrides and run both the core and the
/// curator validation.
///
/// # Errors
///
/// Returns `CliError::Config` when the configuration is invalid.
fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match ClearanceConfig::load(config_path) {
        Ok(config) => match CuratorConfig::from_core(&config).validate() {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        },
        Err(e) => vec![e.to_string()],
    };

    let report = ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    };
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Display the effective configuration (file + env overrides + defaults).
fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = ClearanceConfig::load(config_path).map_err(|e| CliError::Config(e.to_string()))?;
    let config_toml = section_toml(&config, section.as_deref())?;

    writer.render(&ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    })
}

fn section_toml(config: &ClearanceConfig, section: Option<&str>) -> Result<String, CliError> {
    let rendered = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("scope") => toml::to_string_pretty(&config.scope),
        Some("curation") => toml::to_string_pretty(&config.curation),
        Some("dedup") => toml::to_string_pretty(&config.dedup),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: {})",
                SECTIONS.join(", ")
            )));
        }
    };
    rendered.map_err(|e| CliError::Command(format!("cannot render configuration: {e}")))
}

/// Configuration display report.
///
/// `config_toml` is only used by the text renderer.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_section_renders() {
        let config = ClearanceConfig::default();
        for section in SECTIONS {
            let toml = section_toml(&config, Some(section)).expect("section should render");
            assert!(!toml.is_empty(), "{section}");
        }
        let full = section_toml(&config, None).expect("full config should render");
        assert!(full.contains("[curation]"));
    }

    #[test]
    fn test_unknown_section_is_command_error() {
        let err = section_toml(&ClearanceConfig::default(), Some("ebpf")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("general, scope, curation, dedup"));
    }

    #[test]
    fn test_curation_section_lists_rule_dir() {
        let toml = section_toml(&ClearanceConfig::default(), Some("curation")).expect("render");
        assert!(toml.contains("rule_dir"));
    }
}
