//! `clearance archive` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use clearance_core::model::Project;
use clearance_curator::{Inconsistency, LicenseArchive};

use crate::cli::{ArchiveAction, ArchiveArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `archive` command.
pub fn execute(args: ArchiveArgs, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        ArchiveAction::Check { project } => execute_check(&project, config_path, writer),
    }
}

/// Run the two-way consistency check; any finding exits with code 4.
fn execute_check(project_path: &Path, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let (_, curator) = super::load_config(config_path)?;
    let archive = LicenseArchive::open(&curator.archive_dir)?;
    let project = Project::load(project_path)?;
    info!(
        archive = %archive.root().display(),
        packages = project.packs.len(),
        "checking archive consistency"
    );

    let findings = archive.check_consistency(&project)?;
    let report = ConsistencyReport {
        archive: archive.root().display().to_string(),
        files: archive.file_names()?.len(),
        missing: findings
            .iter()
            .filter_map(|f| match f {
                Inconsistency::MissingFile { package, name } => Some(MissingEntry {
                    package: package.to_string(),
                    name: name.clone(),
                }),
                Inconsistency::Orphan { .. } => None,
            })
            .collect(),
        orphans: findings
            .iter()
            .filter_map(|f| match f {
                Inconsistency::Orphan { name } => Some(name.clone()),
                Inconsistency::MissingFile { .. } => None,
            })
            .collect(),
    };
    writer.render(&report)?;

    if findings.is_empty() {
        Ok(())
    } else {
        Err(CliError::Inconsistent(findings.len()))
    }
}

#[derive(Serialize)]
pub struct ConsistencyReport {
    pub archive: String,
    pub files: usize,
    /// model -> archive
    pub missing: Vec<MissingEntry>,
    /// archive -> model
    pub orphans: Vec<String>,
}

#[derive(Serialize)]
pub struct MissingEntry {
    pub package: String,
    pub name: String,
}

impl Render for ConsistencyReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Archive Check: {} ({} files)", self.archive.bold(), self.files)?;
        if self.missing.is_empty() && self.orphans.is_empty() {
            writeln!(w, "  Result: {}", "CONSISTENT".green().bold())?;
            return Ok(());
        }

        writeln!(w, "  Result: {}", "INCONSISTENT".red().bold())?;
        for m in &self.missing {
            writeln!(w, "  missing: {} (referenced by {})", m.name.red(), m.package)?;
        }
        for o in &self.orphans {
            writeln!(w, "  orphan:  {}", o.yellow())?;
        }
        Ok(())
    }
}
