//! Settings persisted as TOML next to the project.

use std::path::{Path, PathBuf};
use tracing::debug;

use autobuild_core::{AutobuildError, Result, Settings, SettingsStore};

/// File name looked up in the project root.
pub const SETTINGS_FILE: &str = "autobuild.toml";

pub fn default_settings_path(project_root: &Path) -> PathBuf {
    project_root.join(SETTINGS_FILE)
}

/// Write default settings to `path`. Refuses to overwrite unless `force`.
pub fn write_default_settings(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(AutobuildError::Settings(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Settings::default().to_toml_string()?)?;
    Ok(())
}

/// Reads settings from a TOML file on every `load`. A missing file means defaults.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file; using defaults");
            return Ok(Settings::default());
        }
        let text = std::fs::read_to_string(&self.path)?;
        Settings::from_toml_str(&text)
    }
}
