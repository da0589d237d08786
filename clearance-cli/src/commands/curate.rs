//! `clearance curate` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use clearance_core::model::Project;
use clearance_curator::{CurationEngine, CurationReport, CurationRuleStore, LicenseArchive};

use crate::cli::CurateArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `curate` command.
///
/// Loads configuration, rules and the model, applies every rule, filters
/// issues by the configured level, checks the archive and writes the
/// curated model as pretty JSON.
pub fn execute(args: CurateArgs, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let (_, curator) = super::load_config(config_path)?;

    let store = CurationRuleStore::load(&curator)?;
    info!(
        rules = store.len(),
        rejected = store.rejections().len(),
        rule_dir = %curator.rule_dir,
        "curation rules loaded"
    );

    let archive = LicenseArchive::open(&curator.archive_dir)?;
    let mut project = Project::load(&args.project)?;
    info!(path = %args.project.display(), packages = project.packs.len(), "model loaded");

    let engine = CurationEngine::new(&curator, &store, &archive)?;
    let report = engine.apply(&mut project);
    let consolidated_all = args
        .consolidate_all
        .then(|| engine.consolidate_all(&mut project));

    project.retain_issues(curator.min_issue_level);

    let inconsistencies = archive
        .check_consistency(&project)?
        .into_iter()
        .map(|i| i.to_string())
        .collect();

    write_model(&project, &args.out)?;
    info!(path = %args.out.display(), "curated model written");

    let summary = CurateSummary {
        project: args.project.display().to_string(),
        output: args.out.display().to_string(),
        rules: store.len(),
        rejected_rules: store.rejections().len(),
        packages: project.packs.len(),
        consolidated_all,
        report,
        inconsistencies,
    };
    writer.render(&summary)
}

fn write_model(project: &Project, out: &Path) -> Result<(), CliError> {
    let output_error = |reason: String| CliError::Output {
        path: out.display().to_string(),
        reason,
    };
    let json = project
        .to_json_pretty()
        .map_err(|e| output_error(e.to_string()))?;
    std::fs::write(out, json).map_err(|e| output_error(e.to_string()))
}

/// Result of a curation run.
#[derive(Serialize)]
pub struct CurateSummary {
    pub project: String,
    pub output: String,
    pub rules: usize,
    pub rejected_rules: usize,
    pub packages: usize,
    /// Entries removed by `--consolidate-all`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consolidated_all: Option<usize>,
    pub report: CurationReport,
    pub inconsistencies: Vec<String>,
}

impl Render for CurateSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let r = &self.report;
        writeln!(w, "Curation: {} -> {}", self.project.bold(), self.output.bold())?;
        writeln!(
            w,
            "  Rules: {} accepted, {} rejected",
            self.rules.to_string().green(),
            if self.rejected_rules > 0 {
                self.rejected_rules.to_string().yellow()
            } else {
                self.rejected_rules.to_string().normal()
            }
        )?;
        writeln!(
            w,
            "  Packages: {} total, {} inserted, {} deleted, {} curated",
            self.packages,
            r.inserted.len(),
            r.deleted.len(),
            r.curated.len()
        )?;
        writeln!(
            w,
            "  Operations: {}, deduplicated: {}, archive errors: {}",
            r.operations, r.dedup_removed, r.archive_errors
        )?;
        if let Some(removed) = self.consolidated_all {
            writeln!(w, "  Consolidate-all removed: {removed}")?;
        }

        if !r.ambiguous.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Skipped (ambiguous rules):".yellow())?;
            for id in &r.ambiguous {
                writeln!(w, "  {id}")?;
            }
        }

        let unresolved: Vec<_> = r.reconciliations.iter().filter(|c| !c.is_exact()).collect();
        if !unresolved.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Issue reconciliation mismatches:".yellow())?;
            for c in unresolved {
                writeln!(
                    w,
                    "  {}: not found [{}], undeclared [{}]",
                    c.package,
                    c.not_found.join(", "),
                    c.undeclared.join(", ")
                )?;
            }
        }

        if !self.inconsistencies.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Archive inconsistencies:".red())?;
            for i in &self.inconsistencies {
                writeln!(w, "  {}", i.red())?;
            }
        }

        Ok(())
    }
}
