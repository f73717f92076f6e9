use crate::types::{ComponentDescriptor, STD_DIR_NAME};
use std::fs;
use std::path::Path;

/// Checks a finished install: every entry binary exists and is executable,
/// and the standard library is present. Read-only.
pub fn verify(library_dir: &Path, components: &[ComponentDescriptor]) -> bool {
    for component in components {
        let binary = component.entry_binary(library_dir);
        if !is_executable(&binary) {
            tracing::warn!("{} is missing or not executable", binary.display());
            return false;
        }
    }

    let std_dir = library_dir.join(STD_DIR_NAME);
    if !std_dir.exists() {
        tracing::warn!("Standard library not found at {}", std_dir.display());
        return false;
    }

    true
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}
