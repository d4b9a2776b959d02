use std::path::{Path, PathBuf};

use addon_updater_core::{UpdateEndpoints, UpdatePreferences, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting '{0}' is not configured")]
    Missing(&'static str),
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub version_url: Option<String>,

    #[serde(default)]
    pub source_url: Option<String>,

    #[serde(default)]
    pub addon_path: Option<PathBuf>,

    #[serde(default)]
    pub current_version: Option<Version>,

    #[serde(default)]
    pub reload_command: Option<Vec<String>>,

    #[serde(default)]
    pub preferences: UpdatePreferences,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version_url: None,
            source_url: None,
            addon_path: None,
            current_version: None,
            reload_command: None,
            preferences: UpdatePreferences::default(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            http_timeout_secs: None,
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_else(|error| {
            log::warn!("Ignoring settings file: {error}");
            Self::default()
        })
    }

    /// Load settings, treating a missing file as defaults but reporting an
    /// unreadable or invalid one.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// Returns [`SettingsError::Missing`] when either URL is unset or blank.
    pub fn endpoints(&self) -> Result<UpdateEndpoints, SettingsError> {
        let version_url = non_empty(self.version_url.as_deref())
            .ok_or(SettingsError::Missing("version_url"))?;
        let source_url = non_empty(self.source_url.as_deref())
            .ok_or(SettingsError::Missing("source_url"))?;
        Ok(UpdateEndpoints {
            version_url: version_url.to_string(),
            source_url: source_url.to_string(),
        })
    }

    /// # Errors
    /// Returns [`SettingsError::Missing`] when no version is recorded.
    pub fn current_version(&self) -> Result<Version, SettingsError> {
        self.current_version.ok_or(SettingsError::Missing("current_version"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use addon_updater_core::{CheckInterval, Version};
    use serde_json::json;

    use super::{AppSettings, SettingsError};

    #[test]
    fn defaults_leave_endpoints_unconfigured() {
        let settings = AppSettings::default();

        assert!(!settings.preferences.auto_update);
        assert_eq!(settings.preferences.check_interval, CheckInterval::Weekly);
        assert_eq!(settings.max_log_size_bytes, 5 * 1024 * 1024);
        assert!(settings.http_timeout_secs.is_none());
        assert!(matches!(
            settings.endpoints(),
            Err(SettingsError::Missing("version_url"))
        ));
        assert!(matches!(
            settings.current_version(),
            Err(SettingsError::Missing("current_version"))
        ));
    }

    #[test]
    fn partial_settings_deserialize_with_defaults() {
        let value = json!({
            "version_url": "https://example.com/version.txt",
            "source_url": "  ",
            "current_version": "1.1.0",
            "preferences": { "check_interval": "monthly" }
        });

        let settings: AppSettings =
            serde_json::from_value(value).expect("settings JSON should deserialize");

        assert_eq!(settings.current_version, Some(Version::new(1, 1, 0)));
        assert_eq!(settings.preferences.check_interval, CheckInterval::Monthly);
        assert!(matches!(
            settings.endpoints(),
            Err(SettingsError::Missing("source_url"))
        ));
    }

    #[test]
    fn save_then_load_round_trips_through_disk() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("nested").join("settings.json");
        let mut settings = AppSettings::default();
        settings.version_url = Some("https://example.com/version.txt".to_string());
        settings.source_url = Some("https://example.com/addon.py".to_string());
        settings.current_version = Some(Version::new(1, 4, 0));
        settings.preferences.auto_update = true;

        settings.save(&path).expect("settings should save");
        let loaded = AppSettings::load(&path);

        assert_eq!(loaded, settings);
        let endpoints = loaded.endpoints().expect("endpoints should be configured");
        assert_eq!(endpoints.source_url, "https://example.com/addon.py");
    }

    #[test]
    fn corrupt_or_missing_file_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("settings.json");

        assert_eq!(AppSettings::load(&path), AppSettings::default());

        std::fs::write(&path, "{ not json").expect("corrupt settings should be written");
        assert_eq!(AppSettings::load(&path), AppSettings::default());
    }

    #[test]
    fn try_load_reports_invalid_file_but_not_missing_one() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("settings.json");

        let missing = AppSettings::try_load(&path).expect("missing file should load defaults");
        assert_eq!(missing, AppSettings::default());

        std::fs::write(&path, "{ not json").expect("corrupt settings should be written");
        assert!(matches!(
            AppSettings::try_load(&path),
            Err(SettingsError::Invalid { .. })
        ));
    }
}
