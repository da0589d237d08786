//! CLI-specific error types and exit code mapping

use clearance_core::error::ClearanceError;
use clearance_curator::{ArchiveError, CuratorError};

/// CLI-specific error type.
///
/// The `exit_code()` method maps each failure class to its own exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// A rule file could not be read or deserialized.
    #[error("rule file error: {0}")]
    RuleFile(String),

    /// Rules were rejected by validation.
    #[error("rule error: {0}")]
    Rule(String),

    /// Model and archive disagree.
    #[error("archive inconsistent: {0} problem(s) found")]
    Inconsistent(usize),

    /// The curated model could not be written.
    #[error("cannot write output {path}: {reason}")]
    Output { path: String, reason: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from clearance-core.
    #[error("{0}")]
    Core(#[from] ClearanceError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error                  |
    /// | 2    | Configuration error                      |
    /// | 3    | Rule file unreadable or unparseable      |
    /// | 4    | Archive consistency violations           |
    /// | 5    | Output could not be written              |
    /// | 10   | Other IO error                           |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::RuleFile(_) => 3,
            Self::Inconsistent(_) => 4,
            Self::Output { .. } => 5,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Rule(_) | Self::Core(_) => 1,
        }
    }
}

impl From<CuratorError> for CliError {
    fn from(e: CuratorError) -> Self {
        match e {
            CuratorError::RuleLoad { .. } => Self::RuleFile(e.to_string()),
            CuratorError::Config { .. } | CuratorError::Glob(_) => Self::Config(e.to_string()),
            CuratorError::Io { source, .. } => Self::Io(source),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<ArchiveError> for CliError {
    fn from(e: ArchiveError) -> Self {
        CuratorError::from(e).into()
    }
}
