use crate::error::InstallError;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use sysinfo::Disks;

const LDCONFIG_CANDIDATES: &[&str] = &["ldconfig", "/sbin/ldconfig", "/usr/sbin/ldconfig"];

/// Read-only questions asked of the host before anything is installed.
///
/// `Ok(false)` means the probe ran and the library is absent; an `Err` means
/// the probe itself could not run.
pub trait HostProbe {
    fn has_shared_library(&self, name: &str) -> Result<bool, InstallError>;
    fn available_space(&self, path: &Path) -> Result<u64, InstallError>;
}

/// Probes the real host through the dynamic-linker cache and mounted disks.
///
/// The `ldconfig -p` listing is read once and reused for every library asked about.
#[derive(Debug, Default)]
pub struct HostSystem {
    linker_cache: OnceCell<String>,
}

impl HostSystem {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_linker_cache(listing: &str) -> Self {
        let host = Self::default();
        let _ = host.linker_cache.set(listing.to_string());
        host
    }

    fn linker_cache(&self) -> Result<&str, InstallError> {
        if let Some(listing) = self.linker_cache.get() {
            return Ok(listing);
        }
        let listing = read_linker_cache()?;
        Ok(self.linker_cache.get_or_init(|| listing))
    }
}

fn read_linker_cache() -> Result<String, InstallError> {
    let mut last_error = String::from("ldconfig not found");

    for program in LDCONFIG_CANDIDATES {
        match Command::new(program).arg("-p").output() {
            Ok(output) if output.status.success() => {
                tracing::trace!("Read linker cache with {}", program);
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            }
            Ok(output) => {
                last_error = format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => {
                tracing::trace!("Could not run {}: {}", program, e);
                last_error = format!("{}: {}", program, e);
            }
        }
    }

    Err(InstallError::ProbeFailure {
        probe: "dynamic linker cache".to_string(),
        reason: last_error,
    })
}

impl HostProbe for HostSystem {
    fn has_shared_library(&self, name: &str) -> Result<bool, InstallError> {
        let listing = self.linker_cache()?;
        Ok(linker_cache_contains(listing, name))
    }

    fn available_space(&self, path: &Path) -> Result<u64, InstallError> {
        let probe_path = existing_ancestor(path);
        let disks = Disks::new_with_refreshed_list();

        let disk = disks
            .list()
            .iter()
            .filter(|disk| probe_path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().components().count())
            .ok_or_else(|| InstallError::ProbeFailure {
                probe: "free space".to_string(),
                reason: format!("no mounted filesystem holds {}", probe_path.display()),
            })?;

        tracing::debug!(
            "{} is on {} with {} bytes free",
            probe_path.display(),
            disk.mount_point().display(),
            disk.available_space()
        );
        Ok(disk.available_space())
    }
}

/// Matches `ldconfig -p` entries whose soname is `name` or `name` plus a
/// numeric version suffix, e.g. `libstdc++.so` matches `libstdc++.so.6`.
pub fn linker_cache_contains(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|soname| {
            soname == name
                || soname
                    .strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(is_version_suffix)
        })
}

/// `6`, `6.0.30`: dot-separated groups of digits, none empty.
fn is_version_suffix(suffix: &str) -> bool {
    !suffix.is_empty()
        && suffix
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// The path itself if it exists, otherwise its closest existing parent.
pub fn existing_ancestor(path: &Path) -> PathBuf {
    let mut current = path;
    loop {
        if current.exists() {
            return current.canonicalize().unwrap_or_else(|_| current.to_path_buf());
        }
        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent,
            _ => return PathBuf::from("/"),
        }
    }
}
