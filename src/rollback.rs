use crate::deploy::make_symlink;
use crate::error::{RollbackFailure, RollbackReport};
use crate::types::{BackupRecord, SymlinkRecord};
use std::fs;
use std::io;
use std::path::Path;

/// Best-effort undo of a failed install. Never fails: every step that does
/// not complete is recorded in the returned report and the rest still run.
///
/// Links this attempt published are only touched while they still point
/// where deployment put them. A link that replaced another one is pointed
/// back at the old target; a link that replaced nothing is removed.
pub fn rollback(
    library_dir: &Path,
    backup: Option<&BackupRecord>,
    published: &[SymlinkRecord],
) -> RollbackReport {
    let mut report = RollbackReport::default();

    match remove_path(library_dir) {
        Ok(removed) => report.removed_partial = removed,
        Err(e) => report.failures.push(RollbackFailure {
            path: library_dir.to_path_buf(),
            action: "remove",
            reason: e.to_string(),
        }),
    }

    if let Some(record) = backup {
        if record.backup_path.exists() {
            match fs::rename(&record.backup_path, library_dir) {
                Ok(()) => {
                    tracing::info!(
                        "Restored {} from {}",
                        library_dir.display(),
                        record.backup_path.display()
                    );
                    report.restored_from = Some(record.backup_path.clone());
                }
                Err(e) => report.failures.push(RollbackFailure {
                    path: record.backup_path.clone(),
                    action: "restore",
                    reason: e.to_string(),
                }),
            }
        } else {
            tracing::warn!("Backup {} is gone; nothing to restore", record.backup_path.display());
        }
    }

    for record in published {
        let still_ours = fs::read_link(&record.link_path)
            .map(|current| current == record.target_path)
            .unwrap_or(false);
        if !still_ours {
            continue;
        }
        match &record.replaced {
            Some(previous) if *previous != record.target_path => {
                relink(record, previous, &mut report)
            }
            // A restored install sits at the same paths, so the link is valid again.
            Some(_) if report.restored_from.is_some() => {}
            _ => unlink(record, &mut report),
        }
    }

    for failure in &report.failures {
        tracing::error!("Rollback: {}", failure);
    }

    report
}

fn unlink(record: &SymlinkRecord, report: &mut RollbackReport) {
    match fs::remove_file(&record.link_path) {
        Ok(()) => report.removed_links.push(record.link_path.clone()),
        Err(e) => report.failures.push(RollbackFailure {
            path: record.link_path.clone(),
            action: "unlink",
            reason: e.to_string(),
        }),
    }
}

/// Puts back a link that deployment replaced.
fn relink(record: &SymlinkRecord, previous: &Path, report: &mut RollbackReport) {
    let result = fs::remove_file(&record.link_path).and_then(|()| make_symlink(previous, &record.link_path));
    match result {
        Ok(()) => {
            tracing::info!(
                "Restored link {} -> {}",
                record.link_path.display(),
                previous.display()
            );
            report.restored_links.push(record.link_path.clone());
        }
        Err(e) => report.failures.push(RollbackFailure {
            path: record.link_path.clone(),
            action: "relink",
            reason: e.to_string(),
        }),
    }
}

fn remove_path(path: &Path) -> io::Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    tracing::info!("Removed {}", path.display());
    Ok(true)
}
