use crate::error::InstallError;
use crate::platform::HostProbe;
use crate::types::InstallTarget;

/// Verifies host prerequisites. Never touches the filesystem.
pub struct SystemChecker<'a> {
    probe: &'a dyn HostProbe,
    required_libraries: Vec<String>,
    min_free_space: u64,
}

impl<'a> SystemChecker<'a> {
    pub fn new(probe: &'a dyn HostProbe, required_libraries: Vec<String>, min_free_space: u64) -> Self {
        Self {
            probe,
            required_libraries,
            min_free_space,
        }
    }

    pub fn check(&self, target: &InstallTarget) -> Result<(), InstallError> {
        for library in &self.required_libraries {
            if !self.probe.has_shared_library(library)? {
                return Err(InstallError::MissingDependency(library.clone()));
            }
            tracing::debug!("Found required library {}", library);
        }

        if self.min_free_space == 0 {
            tracing::debug!("Free space check disabled");
            return Ok(());
        }

        let available = self.probe.available_space(&target.library_dir)?;
        if available < self.min_free_space {
            return Err(InstallError::InsufficientDiskSpace {
                required: self.min_free_space,
                available,
            });
        }

        tracing::info!(
            "System check passed ({} bytes free, {} required)",
            available,
            self.min_free_space
        );
        Ok(())
    }
}
