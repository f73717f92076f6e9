use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const COMPONENTS: [&str; 3] = ["ryton", "rytonpm", "rytonbuilder"];

/// An isolated home directory plus a source distribution to install from.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub home: PathBuf,
    pub source: PathBuf,
    pub config_path: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("home");
        let source = temp_dir.path().join("dist");
        let config_path = temp_dir.path().join("installer.json");
        fs::create_dir_all(&home).expect("Failed to create home");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_ryton-installer"));

        let ctx = Self {
            _temp_dir: temp_dir,
            home,
            source,
            config_path,
            bin_path,
        };
        ctx.write_distribution("1.0");
        ctx
    }

    /// Lays out the three component trees, each with an executable entry binary.
    pub fn write_distribution(&self, version: &str) {
        if self.source.exists() {
            fs::remove_dir_all(&self.source).expect("Failed to clear source");
        }
        for name in COMPONENTS {
            let dir = self.source.join(name);
            fs::create_dir_all(&dir).expect("Failed to create component dir");
            let binary = dir.join(format!("{}.bin", name));
            fs::write(&binary, format!("#!/bin/sh\necho {} {}\n", name, version))
                .expect("Failed to write binary");
            fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
                .expect("Failed to chmod binary");
        }
        let std_dir = self.source.join("ryton").join("std");
        fs::create_dir_all(&std_dir).expect("Failed to create std");
        fs::write(std_dir.join("prelude.ry"), version).expect("Failed to write std");
    }

    pub fn library_dir(&self) -> PathBuf {
        self.home.join(".local").join("lib").join("ryton")
    }

    pub fn binary_dir(&self) -> PathBuf {
        self.home.join(".local").join("bin")
    }

    pub fn backups(&self) -> Vec<PathBuf> {
        let parent = self.home.join(".local").join("lib");
        let Ok(entries) = fs::read_dir(parent) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with("ryton_backup_"))
            })
            .collect();
        found.sort();
        found
    }

    /// A command with prerequisite checks relaxed so it runs on any host.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("HOME", &self.home);
        cmd.env("XDG_CONFIG_HOME", self.home.join(".config"));
        cmd.env("RYTON_INSTALLER_CONFIG", &self.config_path);
        cmd.env("RYTON_REQUIRED_LIBS", "");
        cmd.env("RYTON_MIN_FREE_SPACE", "0");
        cmd.env_remove("RYTON_VERIFY_POLICY");
        cmd.env_remove("RUST_LOG");
        cmd.arg("--source").arg(&self.source);
        cmd
    }
}

/// Relative paths and contents of everything under `dir`, links unresolved.
#[allow(dead_code)]
pub fn read_tree(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut entries: Vec<(PathBuf, String)> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .flatten()
        .map(|e| {
            let rel = e.path().strip_prefix(dir).expect("entry under root").to_path_buf();
            let content = if e.file_type().is_symlink() {
                format!("-> {}", fs::read_link(e.path()).expect("read link").display())
            } else if e.file_type().is_dir() {
                "<dir>".to_string()
            } else {
                fs::read_to_string(e.path()).unwrap_or_default()
            };
            (rel, content)
        })
        .collect();
    entries.sort();
    entries
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_exit_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Unexpected exit status\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
