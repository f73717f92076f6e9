use crate::types::InstallStage;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Invalid install type '{0}'. Valid types: system, user")]
    InvalidInstallType(String),

    #[error("Could not determine the home directory for a user install")]
    HomeDirUnavailable,

    #[error("Required library {0} not found")]
    MissingDependency(String),

    #[error("Could not run {probe} probe: {reason}")]
    ProbeFailure { probe: String, reason: String },

    #[error("Not enough disk space: {required} bytes required, {available} bytes available")]
    InsufficientDiskSpace { required: u64, available: u64 },

    #[error("Could not back up {path}: {reason}")]
    BackupFailure { path: PathBuf, reason: String },

    #[error("Could not copy component {component}: {reason}")]
    CopyFailure { component: String, reason: String },

    #[error("Could not link {link} -> {target}: {reason}")]
    SymlinkFailure {
        link: PathBuf,
        target: PathBuf,
        reason: String,
    },

    #[error("Installation at {0} did not pass verification")]
    VerificationFailure(PathBuf),
}

/// A cleanup step that did not complete during rollback. Reported only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackFailure {
    pub path: PathBuf,
    pub action: &'static str,
    pub reason: String,
}

impl fmt::Display for RollbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not {} {}: {}",
            self.action,
            self.path.display(),
            self.reason
        )
    }
}

/// Outcome of a best-effort rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub removed_partial: bool,
    pub restored_from: Option<PathBuf>,
    pub removed_links: Vec<PathBuf>,
    pub restored_links: Vec<PathBuf>,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A failed install attempt: the error that stopped it, and separately what
/// cleanup managed to do.
#[derive(Debug, Error)]
#[error("Installation failed during {stage}: {error}")]
pub struct InstallFailure {
    pub stage: InstallStage,
    #[source]
    pub error: InstallError,
    pub rollback: Option<RollbackReport>,
}

impl InstallFailure {
    pub fn new(stage: InstallStage, error: InstallError) -> Self {
        Self {
            stage,
            error,
            rollback: None,
        }
    }

    pub fn with_rollback(mut self, report: RollbackReport) -> Self {
        self.rollback = Some(report);
        self
    }
}
