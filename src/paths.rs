use crate::error::InstallError;
use crate::types::{InstallKind, InstallTarget};
use std::path::PathBuf;

pub const SYSTEM_LIBRARY_DIR: &str = "/usr/local/lib/ryton";
pub const SYSTEM_BINARY_DIR: &str = "/usr/local/bin";

/// Maps an install type to its library and binary directories.
#[derive(Debug, Clone)]
pub struct PathResolver {
    home: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    pub fn from_env() -> Self {
        let home = dirs::home_dir();
        tracing::debug!("Home directory: {:?}", home);
        Self::new(home)
    }

    pub fn resolve(&self, kind: InstallKind) -> Result<InstallTarget, InstallError> {
        match kind {
            InstallKind::System => Ok(InstallTarget::new(
                kind,
                SYSTEM_LIBRARY_DIR,
                SYSTEM_BINARY_DIR,
            )),
            InstallKind::User => {
                let home = self.home.as_ref().ok_or(InstallError::HomeDirUnavailable)?;
                let local = home.join(".local");
                Ok(InstallTarget::new(
                    kind,
                    local.join("lib").join("ryton"),
                    local.join("bin"),
                ))
            }
        }
    }

    pub fn resolve_token(&self, token: &str) -> Result<InstallTarget, InstallError> {
        self.resolve(token.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn resolver() -> PathResolver {
        PathResolver::new(Some(PathBuf::from("/home/alice")))
    }

    #[test]
    fn test_user_paths_live_under_home() {
        let target = resolver().resolve_token("user").unwrap();
        assert_eq!(target.kind, InstallKind::User);
        assert_eq!(target.library_dir, Path::new("/home/alice/.local/lib/ryton"));
        assert_eq!(target.binary_dir, Path::new("/home/alice/.local/bin"));
    }

    #[test]
    fn test_system_paths_are_fixed() {
        let target = PathResolver::new(None).resolve_token("system").unwrap();
        assert_eq!(target.library_dir, Path::new(SYSTEM_LIBRARY_DIR));
        assert_eq!(target.binary_dir, Path::new(SYSTEM_BINARY_DIR));
    }

    #[test]
    fn test_system_and_user_do_not_overlap() {
        let system = resolver().resolve(InstallKind::System).unwrap();
        let user = resolver().resolve(InstallKind::User).unwrap();

        let system_dirs = [&system.library_dir, &system.binary_dir];
        let user_dirs = [&user.library_dir, &user.binary_dir];
        for s in system_dirs {
            for u in user_dirs {
                assert!(!s.starts_with(u) && !u.starts_with(s), "{:?} overlaps {:?}", s, u);
            }
        }
        assert_ne!(system.library_dir, system.binary_dir);
        assert_ne!(user.library_dir, user.binary_dir);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let err = resolver().resolve_token("global").unwrap_err();
        assert!(matches!(err, InstallError::InvalidInstallType(ref t) if t == "global"));
    }

    #[test]
    fn test_user_install_without_home() {
        let err = PathResolver::new(None).resolve(InstallKind::User).unwrap_err();
        assert!(matches!(err, InstallError::HomeDirUnavailable));
    }
}
