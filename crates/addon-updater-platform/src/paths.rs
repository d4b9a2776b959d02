use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "addon-updater";
const SETTINGS_FILE_NAME: &str = "settings.json";
const LOG_FILE_NAME: &str = "debug.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

/// Where the updater keeps its settings file and log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve the per-user directories for the current platform.
    ///
    /// On macOS settings and log share `~/Library/Application Support`;
    /// elsewhere they follow the platform's config and data directories.
    ///
    /// # Errors
    /// Returns an error when a base directory cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        let (config_base, data_base) = platform_bases()?;
        Ok(Self {
            config_dir: config_base.join(APP_DIR_NAME),
            data_dir: data_base.join(APP_DIR_NAME),
        })
    }

    /// Keep settings and log under `root`, for `--home` overrides.
    #[must_use]
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    /// Create the config and data directories if needed.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn platform_bases() -> Result<(PathBuf, PathBuf), AppPathsError> {
    let support = dirs::home_dir()
        .ok_or(AppPathsError::HomeDirUnavailable)?
        .join("Library/Application Support");
    Ok((support.clone(), support))
}

#[cfg(not(target_os = "macos"))]
fn platform_bases() -> Result<(PathBuf, PathBuf), AppPathsError> {
    let config = dirs::config_dir().ok_or(AppPathsError::ConfigDirUnavailable)?;
    let data = dirs::data_dir().ok_or(AppPathsError::DataDirUnavailable)?;
    Ok((config, data))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::AppPaths;

    #[test]
    fn rooted_paths_split_settings_and_log() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let paths = AppPaths::rooted_at(temp_dir.path());

        assert_eq!(
            paths.settings_file(),
            temp_dir.path().join("config").join("settings.json")
        );
        assert!(paths.log_file().ends_with(Path::new("data").join("debug.log")));
        assert!(paths.log_file().starts_with(temp_dir.path()));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let paths = AppPaths::rooted_at(temp_dir.path().join("nested"));

        paths.ensure_dirs().expect("first ensure_dirs should create directories");
        paths.ensure_dirs().expect("second ensure_dirs should be a no-op");

        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
    }
}
