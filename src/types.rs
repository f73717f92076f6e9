use crate::error::InstallError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const RUNTIME: &str = "ryton";
pub const PACKAGE_MANAGER: &str = "rytonpm";
pub const BUILDER: &str = "rytonbuilder";

/// Subtree of the runtime that holds the standard library.
pub const STD_DIR_NAME: &str = "std";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstallKind {
    System,
    #[default]
    User,
}

impl FromStr for InstallKind {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(InstallKind::System),
            "user" => Ok(InstallKind::User),
            other => Err(InstallError::InvalidInstallType(other.to_string())),
        }
    }
}

impl fmt::Display for InstallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallKind::System => write!(f, "system"),
            InstallKind::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallTarget {
    pub kind: InstallKind,
    pub library_dir: PathBuf,
    pub binary_dir: PathBuf,
}

impl InstallTarget {
    pub fn new(kind: InstallKind, library_dir: impl Into<PathBuf>, binary_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            library_dir: library_dir.into(),
            binary_dir: binary_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComponentRole {
    Runtime,
    PackageManager,
    Builder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub name: String,
    pub role: ComponentRole,
    pub source_dir: PathBuf,
    pub entry_binary_name: String,
}

impl ComponentDescriptor {
    pub fn new(name: &str, role: ComponentRole, source_root: &Path) -> Self {
        Self {
            name: name.to_string(),
            role,
            source_dir: source_root.join(name),
            entry_binary_name: format!("{}.bin", name),
        }
    }

    /// The runtime, package manager and builder, in deployment order.
    pub fn standard_set(source_root: &Path) -> Vec<ComponentDescriptor> {
        vec![
            ComponentDescriptor::new(RUNTIME, ComponentRole::Runtime, source_root),
            ComponentDescriptor::new(PACKAGE_MANAGER, ComponentRole::PackageManager, source_root),
            ComponentDescriptor::new(BUILDER, ComponentRole::Builder, source_root),
        ]
    }

    pub fn install_dir(&self, library_dir: &Path) -> PathBuf {
        library_dir.join(&self.name)
    }

    pub fn entry_binary(&self, library_dir: &Path) -> PathBuf {
        self.install_dir(library_dir).join(&self.entry_binary_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymlinkRecord {
    pub link_path: PathBuf,
    pub target_path: PathBuf,
    /// Where the link at `link_path` pointed before it was replaced, if one was there.
    #[serde(default)]
    pub replaced: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupRecord {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InstallStage {
    Start,
    Checked,
    BackedUp,
    Deployed,
    Verified,
    Success,
    RollingBack,
    Failed,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::Start => "start",
            InstallStage::Checked => "system check",
            InstallStage::BackedUp => "backup",
            InstallStage::Deployed => "deployment",
            InstallStage::Verified => "verification",
            InstallStage::Success => "success",
            InstallStage::RollingBack => "rollback",
            InstallStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What to do when the post-install check fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerifyPolicy {
    #[default]
    Rollback,
    Report,
}

impl FromStr for VerifyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rollback" => Ok(VerifyPolicy::Rollback),
            "report" => Ok(VerifyPolicy::Report),
            other => Err(format!(
                "Invalid verify policy '{}'. Valid values: rollback, report",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallerSettings {
    #[serde(default = "default_required_libraries")]
    pub required_libraries: Vec<String>,
    #[serde(default = "default_min_free_space")]
    pub min_free_space: u64,
    #[serde(default)]
    pub verify_policy: VerifyPolicy,
}

fn default_required_libraries() -> Vec<String> {
    vec!["libpython3.so".to_string(), "libstdc++.so".to_string()]
}

fn default_min_free_space() -> u64 {
    100_000_000
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            required_libraries: default_required_libraries(),
            min_free_space: default_min_free_space(),
            verify_policy: VerifyPolicy::default(),
        }
    }
}
