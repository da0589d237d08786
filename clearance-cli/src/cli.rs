//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Clearance -- license and copyright curation for scanned packages.
///
/// Use `clearance <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "clearance", version, about, long_about = None)]
pub struct Cli {
    /// Path to the clearance.toml configuration file.
    #[arg(short, long, default_value = "clearance.toml", global = true)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply curation rules to a scanned package model.
    Curate(CurateArgs),

    /// Inspect and validate curation rules.
    Rules(RulesArgs),

    /// Inspect the license archive.
    Archive(ArchiveArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- curate ----

/// Curate a model and write the result as JSON.
#[derive(Args, Debug)]
pub struct CurateArgs {
    /// Scanned package model (JSON).
    #[arg(short, long)]
    pub project: PathBuf,

    /// Where to write the curated model.
    #[arg(short = 'O', long)]
    pub out: PathBuf,

    /// Consolidate every package, not only curated ones.
    #[arg(long)]
    pub consolidate_all: bool,
}

// ---- rules ----

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List accepted curation rules.
    List {
        /// Filter by package modifier (insert, update, delete).
        #[arg(long)]
        modifier: Option<String>,
    },
    /// Load and validate rule documents, reporting rejections.
    Validate {
        /// Rule directory (default: curation.rule_dir from the configuration).
        path: Option<PathBuf>,
    },
}

// ---- archive ----

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    #[command(subcommand)]
    pub action: ArchiveAction,
}

#[derive(Subcommand, Debug)]
pub enum ArchiveAction {
    /// Check that the model and the archive reference the same files.
    Check {
        /// Curated package model (JSON).
        #[arg(short, long)]
        project: PathBuf,
    },
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, scope, curation, dedup).
        #[arg(long)]
        section: Option<String>,
    },
}
