use crate::error::InstallError;
use crate::types::BackupRecord;
use chrono::Local;
use std::fs;
use std::path::Path;

pub const BACKUP_PREFIX: &str = "ryton_backup_";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Moves a prior install out of the way before the new one is written.
///
/// Returns `None` when there is nothing at `library_dir`.
pub fn backup(library_dir: &Path) -> Result<Option<BackupRecord>, InstallError> {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    backup_with_timestamp(library_dir, &timestamp)
}

pub fn backup_with_timestamp(
    library_dir: &Path,
    timestamp: &str,
) -> Result<Option<BackupRecord>, InstallError> {
    if fs::symlink_metadata(library_dir).is_err() {
        tracing::debug!("No prior install at {}", library_dir.display());
        return Ok(None);
    }

    let parent = library_dir
        .parent()
        .ok_or_else(|| InstallError::BackupFailure {
            path: library_dir.to_path_buf(),
            reason: "install path has no parent directory".to_string(),
        })?;
    let backup_path = parent.join(format!("{}{}", BACKUP_PREFIX, timestamp));

    if fs::symlink_metadata(&backup_path).is_ok() {
        return Err(InstallError::BackupFailure {
            path: library_dir.to_path_buf(),
            reason: format!("{} already exists", backup_path.display()),
        });
    }

    // rename only: a cross-device move fails here rather than degrading to copy
    fs::rename(library_dir, &backup_path).map_err(|e| InstallError::BackupFailure {
        path: library_dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        "Backed up {} to {}",
        library_dir.display(),
        backup_path.display()
    );

    Ok(Some(BackupRecord {
        original_path: library_dir.to_path_buf(),
        backup_path,
        timestamp: timestamp.to_string(),
    }))
}
