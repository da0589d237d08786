//! `clearance rules` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use clearance_curator::rule::{CurationRule, PackageOp, RuleLoader};
use clearance_curator::{CurationRuleStore, CuratorConfig};

use crate::cli::{RulesAction, RulesArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `rules` command.
pub fn execute(args: RulesArgs, config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let (_, curator) = super::load_config(config_path)?;
    match args.action {
        RulesAction::List { modifier } => execute_list(&curator, modifier.as_deref(), writer),
        RulesAction::Validate { path } => execute_validate(&curator, path, writer),
    }
}

fn execute_list(
    curator: &CuratorConfig,
    modifier: Option<&str>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let filter = modifier
        .map(|m| {
            m.parse::<PackageOp>().map_err(|e| {
                CliError::Command(format!("{e} (expected: insert, update, delete)"))
            })
        })
        .transpose()?;

    info!(rule_dir = %curator.rule_dir, "loading curation rules");
    let store = CurationRuleStore::load(curator)?;

    let rules: Vec<RuleEntry> = store
        .rules()
        .iter()
        .filter(|r| filter.is_none_or(|op| r.op == op))
        .map(RuleEntry::from)
        .collect();

    writer.render(&RuleListReport {
        total: rules.len(),
        rules,
    })
}

fn execute_validate(
    curator: &CuratorConfig,
    path: Option<PathBuf>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let dir = path.unwrap_or_else(|| PathBuf::from(&curator.rule_dir));
    info!(path = %dir.display(), "validating curation rules");

    let loader = RuleLoader::new(curator.max_rule_file_size, curator.max_rule_files);
    let outcome = loader.load_directory(&dir, Path::new(&curator.file_store))?;

    let report = RuleValidationReport {
        path: dir.display().to_string(),
        files: outcome.files,
        accepted: outcome.rules.len(),
        rejected: outcome.rejections.len(),
        rejections: outcome
            .rejections
            .iter()
            .map(|r| RejectionEntry {
                rule_id: r.rule_id.clone(),
                source: r.source.clone(),
                reason: r.reason.to_string(),
            })
            .collect(),
    };
    writer.render(&report)?;

    if report.rejected > 0 {
        return Err(CliError::Rule(format!("{} rule(s) rejected", report.rejected)));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct RuleListReport {
    pub total: usize,
    pub rules: Vec<RuleEntry>,
}

#[derive(Serialize)]
pub struct RuleEntry {
    pub id: String,
    pub modifier: String,
    pub file_scopes: usize,
    pub resolved_issues: Vec<String>,
    pub source: String,
}

impl From<&CurationRule> for RuleEntry {
    fn from(rule: &CurationRule) -> Self {
        Self {
            id: rule.id.clone(),
            modifier: rule.op.to_string(),
            file_scopes: rule.items.len(),
            resolved_issues: rule.resolved_issues.clone(),
            source: rule.source.display().to_string(),
        }
    }
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Curation Rules ({} total)", self.total.to_string().bold())?;
        writeln!(w)?;
        writeln!(w, "{:<45} {:<8} {:<7} Source", "ID", "Modifier", "Scopes")?;
        writeln!(w, "{}", "-".repeat(90))?;

        for r in &self.rules {
            let modifier = match r.modifier.as_str() {
                "insert" => r.modifier.green(),
                "delete" => r.modifier.red(),
                _ => r.modifier.normal(),
            };
            writeln!(
                w,
                "{:<45} {:<8} {:<7} {}",
                r.id, modifier, r.file_scopes, r.source
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleValidationReport {
    pub path: String,
    pub files: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub rejections: Vec<RejectionEntry>,
}

#[derive(Serialize)]
pub struct RejectionEntry {
    pub rule_id: String,
    pub source: String,
    pub reason: String,
}

impl Render for RuleValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Validation: {}", self.path.bold())?;
        writeln!(
            w,
            "  Files: {}, rules: {} accepted, {} rejected",
            self.files,
            self.accepted.to_string().green(),
            if self.rejected > 0 {
                self.rejected.to_string().red()
            } else {
                self.rejected.to_string().normal()
            }
        )?;

        if !self.rejections.is_empty() {
            writeln!(w)?;
            writeln!(w, "Rejected:")?;
            for r in &self.rejections {
                writeln!(w, "  {} ({}): {}", r.rule_id.red(), r.source, r.reason)?;
            }
        }
        Ok(())
    }
}
