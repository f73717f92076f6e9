use crate::error::InstallError;
use crate::types::{ComponentDescriptor, ComponentRole, InstallTarget, SymlinkRecord, STD_DIR_NAME};
use indicatif::ProgressBar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copies each component into the library directory and links its entry
/// binary into the binary directory.
///
/// Every link this creates is appended to `published`, also on failure, so a
/// caller rolling back knows what to undo. A partial deployment is left as is.
pub fn deploy(
    components: &[ComponentDescriptor],
    target: &InstallTarget,
    published: &mut Vec<SymlinkRecord>,
    progress: &ProgressBar,
) -> Result<(), InstallError> {
    fs::create_dir_all(&target.library_dir).map_err(|e| InstallError::CopyFailure {
        component: components
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_default(),
        reason: format!("cannot create {}: {}", target.library_dir.display(), e),
    })?;

    for component in components {
        progress.set_message(format!("Installing {}", component.name));

        let destination = component.install_dir(&target.library_dir);
        copy_tree(&component.source_dir, &destination).map_err(|e| InstallError::CopyFailure {
            component: component.name.clone(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            "Copied {} to {}",
            component.source_dir.display(),
            destination.display()
        );

        if component.role == ComponentRole::Runtime {
            publish_std(component, target)?;
        }

        fs::create_dir_all(&target.binary_dir).map_err(|e| InstallError::SymlinkFailure {
            link: target.binary_dir.clone(),
            target: destination.clone(),
            reason: e.to_string(),
        })?;

        let link_path = target.binary_dir.join(&component.name);
        let target_path = component.entry_binary(&target.library_dir);
        let replaced = replace_symlink(&target_path, &link_path)?;
        let record = SymlinkRecord {
            link_path,
            target_path,
            replaced,
        };
        tracing::info!(
            "Linked {} -> {}",
            record.link_path.display(),
            record.target_path.display()
        );
        published.push(record);

        progress.inc(1);
    }

    Ok(())
}

/// Recursively copies `source` to `destination`, which must not exist yet.
/// Symlinks are recreated, not followed.
pub fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        ));
    }
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory {} not found", source.display()),
        ));
    }

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let out = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&out)?;
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(entry.path())?;
            make_symlink(&link_target, &out)?;
        } else {
            // fs::copy carries permission bits, keeping entry binaries executable
            fs::copy(entry.path(), &out).map_err(|e| {
                io::Error::new(e.kind(), format!("{}: {}", entry.path().display(), e))
            })?;
        }
    }

    Ok(())
}

fn publish_std(runtime: &ComponentDescriptor, target: &InstallTarget) -> Result<(), InstallError> {
    let std_in_runtime = runtime.install_dir(&target.library_dir).join(STD_DIR_NAME);
    if !std_in_runtime.is_dir() {
        tracing::warn!(
            "{} has no {} directory; the install will not verify",
            runtime.name,
            STD_DIR_NAME
        );
        return Ok(());
    }

    let link = target.library_dir.join(STD_DIR_NAME);
    let relative = Path::new(&runtime.name).join(STD_DIR_NAME);
    replace_symlink(&relative, &link)?;
    tracing::debug!("Published standard library at {}", link.display());
    Ok(())
}

/// Removes whatever link sits at `link`, dangling or not, and points a new one at `target`.
/// Returns where the removed link pointed.
fn replace_symlink(target: &Path, link: &Path) -> Result<Option<PathBuf>, InstallError> {
    let failure = |e: io::Error| InstallError::SymlinkFailure {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        reason: e.to_string(),
    };

    let mut replaced = None;
    if fs::symlink_metadata(link).is_ok() {
        tracing::debug!("Replacing existing {}", link.display());
        replaced = fs::read_link(link).ok();
        fs::remove_file(link).map_err(failure)?;
    }
    make_symlink(target, link).map_err(failure)?;
    Ok(replaced)
}

#[cfg(unix)]
pub(crate) fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
pub(crate) fn make_symlink(_target: &Path, link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot create symlink {} on this platform", link.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallKind;
    use tempfile::tempdir;

    #[test]
    fn test_copy_tree_refuses_existing_destination() {
        let root = tempdir().unwrap();
        let src = root.path().join("src");
        let dst = root.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();

        let err = copy_tree(&src, &dst).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_copy_tree_copies_nested_files_and_links() {
        let root = tempdir().unwrap();
        let src = root.path().join("src");
        fs::create_dir_all(src.join("std").join("io")).unwrap();
        fs::write(src.join("std").join("io").join("mod.ry"), "io").unwrap();
        std::os::unix::fs::symlink("std/io", src.join("io")).unwrap();

        let dst = root.path().join("dst");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("std/io/mod.ry")).unwrap(), "io");
        assert_eq!(fs::read_link(dst.join("io")).unwrap(), Path::new("std/io"));
    }

    #[test]
    fn test_deploy_replaces_dangling_link() {
        let root = tempdir().unwrap();
        let source_root = root.path().join("source");
        let dir = source_root.join("ryton");
        fs::create_dir_all(dir.join("std")).unwrap();
        fs::write(dir.join("ryton.bin"), "#!/bin/sh\n").unwrap();

        let target = InstallTarget::new(
            InstallKind::User,
            root.path().join("lib/ryton"),
            root.path().join("bin"),
        );
        fs::create_dir_all(&target.binary_dir).unwrap();
        std::os::unix::fs::symlink("/nonexistent/ryton.bin", target.binary_dir.join("ryton")).unwrap();

        let components = vec![ComponentDescriptor::new("ryton", ComponentRole::Runtime, &source_root)];
        let mut published = Vec::new();
        deploy(&components, &target, &mut published, &ProgressBar::hidden()).unwrap();

        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].replaced.as_deref(),
            Some(Path::new("/nonexistent/ryton.bin"))
        );
        assert_eq!(
            fs::read_link(target.binary_dir.join("ryton")).unwrap(),
            target.library_dir.join("ryton/ryton.bin")
        );
        assert!(target.library_dir.join("std").is_dir());
    }

    #[test]
    fn test_deploy_reports_missing_source() {
        let root = tempdir().unwrap();
        let target = InstallTarget::new(
            InstallKind::User,
            root.path().join("lib/ryton"),
            root.path().join("bin"),
        );
        let components = vec![ComponentDescriptor::new(
            "rytonpm",
            ComponentRole::PackageManager,
            &root.path().join("missing"),
        )];

        let mut published = Vec::new();
        let err = deploy(&components, &target, &mut published, &ProgressBar::hidden()).unwrap_err();

        assert!(matches!(err, InstallError::CopyFailure { ref component, .. } if component == "rytonpm"));
        assert!(published.is_empty());
    }
}
