use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "ryton";
pub const CONFIG_FILE_NAME: &str = "installer.json";

pub const CONFIG_PATH_ENV: &str = "RYTON_INSTALLER_CONFIG";
pub const REQUIRED_LIBS_ENV: &str = "RYTON_REQUIRED_LIBS";
pub const MIN_FREE_SPACE_ENV: &str = "RYTON_MIN_FREE_SPACE";
pub const VERIFY_POLICY_ENV: &str = "RYTON_VERIFY_POLICY";

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let path = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

/// Reads installer settings. A missing file means defaults; nothing is written.
pub fn load_settings() -> Result<InstallerSettings> {
    let config_path = get_config_file_path()?;

    let mut settings = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Could not read config file at {}", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Could not parse {} as JSON", config_path.display()))?
    } else {
        InstallerSettings::default()
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub fn apply_env_overrides<F>(settings: &mut InstallerSettings, var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(libs) = var(REQUIRED_LIBS_ENV) {
        settings.required_libraries = parse_library_list(&libs);
    }

    if let Some(bytes) = var(MIN_FREE_SPACE_ENV) {
        settings.min_free_space = bytes
            .trim()
            .parse()
            .with_context(|| format!("{} must be a byte count, got '{}'", MIN_FREE_SPACE_ENV, bytes))?;
    }

    if let Some(policy) = var(VERIFY_POLICY_ENV) {
        settings.verify_policy = policy.parse().map_err(anyhow::Error::msg)?;
    }

    Ok(())
}

pub fn parse_library_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
