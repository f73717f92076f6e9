//! Installation lifecycle
//!
//! Drives one install attempt through
//! `Start -> Checked -> BackedUp -> Deployed -> Verified -> Success`.
//! Anything that fails after the backup step rolls back before the error is
//! returned; a failed system check returns without touching the filesystem.

use crate::backup;
use crate::check::SystemChecker;
use crate::deploy;
use crate::error::{InstallError, InstallFailure};
use crate::rollback;
use crate::types::*;
use crate::verify;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub target: InstallTarget,
    pub backup: Option<BackupRecord>,
    pub symlinks: Vec<SymlinkRecord>,
}

pub struct Installer<'a> {
    checker: SystemChecker<'a>,
    components: Vec<ComponentDescriptor>,
    verify_policy: VerifyPolicy,
    backup_timestamp: Option<String>,
    progress: ProgressBar,
}

impl<'a> Installer<'a> {
    pub fn new(
        checker: SystemChecker<'a>,
        components: Vec<ComponentDescriptor>,
        verify_policy: VerifyPolicy,
    ) -> Self {
        Self {
            checker,
            components,
            verify_policy,
            backup_timestamp: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Show a progress bar over the component copies.
    pub fn with_progress(mut self) -> Self {
        let pb = ProgressBar::new(self.components.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        self.progress = pb;
        self
    }

    /// Name the backup with `timestamp` instead of the current local time.
    pub fn with_backup_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.backup_timestamp = Some(timestamp.into());
        self
    }

    pub fn run(&self, target: &InstallTarget) -> Result<InstallReport, InstallFailure> {
        let mut stage = InstallStage::Start;
        tracing::info!(
            "Starting Ryton installation ({}) into {}",
            target.kind,
            target.library_dir.display()
        );

        self.checker
            .check(target)
            .map_err(|e| self.fail(stage, e))?;
        stage = self.advance(stage, InstallStage::Checked);

        let backup = match &self.backup_timestamp {
            Some(timestamp) => backup::backup_with_timestamp(&target.library_dir, timestamp),
            None => backup::backup(&target.library_dir),
        }
        .map_err(|e| self.fail(stage, e))?;
        stage = self.advance(stage, InstallStage::BackedUp);

        let mut symlinks = Vec::new();
        if let Err(e) = deploy::deploy(&self.components, target, &mut symlinks, &self.progress) {
            return Err(self.roll_back(stage, e, target, backup.as_ref(), &symlinks));
        }
        stage = self.advance(stage, InstallStage::Deployed);

        if !verify::verify(&target.library_dir, &self.components) {
            let error = InstallError::VerificationFailure(target.library_dir.clone());
            return Err(match self.verify_policy {
                VerifyPolicy::Rollback => {
                    self.roll_back(stage, error, target, backup.as_ref(), &symlinks)
                }
                VerifyPolicy::Report => {
                    tracing::warn!(
                        "Leaving unverified install at {} in place",
                        target.library_dir.display()
                    );
                    self.fail(stage, error)
                }
            });
        }
        stage = self.advance(stage, InstallStage::Verified);

        self.progress.finish_and_clear();
        self.advance(stage, InstallStage::Success);

        if let Some(record) = &backup {
            tracing::info!("Previous install kept at {}", record.backup_path.display());
        }

        Ok(InstallReport {
            target: target.clone(),
            backup,
            symlinks,
        })
    }

    fn advance(&self, from: InstallStage, to: InstallStage) -> InstallStage {
        tracing::debug!("Install stage {:?} -> {:?}", from, to);
        to
    }

    fn fail(&self, stage: InstallStage, error: InstallError) -> InstallFailure {
        self.progress.abandon();
        tracing::info!("Failed after {:?}: {}", stage, error);
        self.advance(stage, InstallStage::Failed);
        InstallFailure::new(failing_step(stage), error)
    }

    fn roll_back(
        &self,
        stage: InstallStage,
        error: InstallError,
        target: &InstallTarget,
        backup: Option<&BackupRecord>,
        symlinks: &[SymlinkRecord],
    ) -> InstallFailure {
        self.progress.abandon();
        tracing::info!("Failed after {:?}: {}", stage, error);
        let stage_failed = failing_step(stage);

        let rolling_back = self.advance(stage, InstallStage::RollingBack);
        let report = rollback::rollback(&target.library_dir, backup, symlinks);
        self.advance(rolling_back, InstallStage::Failed);

        InstallFailure::new(stage_failed, error).with_rollback(report)
    }
}

/// The step being attempted when the last completed stage was `stage`.
fn failing_step(stage: InstallStage) -> InstallStage {
    match stage {
        InstallStage::Start => InstallStage::Checked,
        InstallStage::Checked => InstallStage::BackedUp,
        InstallStage::BackedUp => InstallStage::Deployed,
        InstallStage::Deployed => InstallStage::Verified,
        other => other,
    }
}
